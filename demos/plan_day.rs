//! Build a focus plan and duration predictions for a sample day

use focus_engine::FocusEngine;

fn main() {
    let request = r#"{
        "tasks": [
            { "id": "t1", "title": "Finish quarterly report", "type": "writing", "priority": "high", "estimated_minutes": 90, "due_date": "2024-01-15T17:00:00Z" },
            { "id": "t2", "title": "Review pull requests", "type": "review", "priority": "medium" },
            { "id": "t3", "title": "Reply to vendor emails", "type": "email", "priority": "low", "estimated_minutes": 20 },
            { "id": "t4", "title": "Fix complex caching bug", "type": "coding", "priority": "urgent", "estimated_minutes": 120 }
        ],
        "user_preferences": { "peak_productivity_hours": [9, 10, 11, 14, 15], "preferred_focus_duration": 45 },
        "available_hours": 6,
        "historical_data": [
            { "title": "Fix caching bug", "type": "coding", "actual_minutes": 150 },
            { "title": "Review pull requests", "type": "review", "actual_minutes": 25 }
        ]
    }"#;

    let engine = FocusEngine::new();

    match engine.generate_focus_plan_json(request) {
        Ok(plan) => println!("{plan}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }

    match engine.batch_predict_json(request) {
        Ok(predictions) => println!("{predictions}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
