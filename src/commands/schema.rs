//! The slash-command schema registered with the host platform. The
//! choice lists here are the range check for every argument the
//! dispatcher receives; the core only re-validates semantically.

use serde_json::{Value, json};

use crate::roster::Job;

pub const MINUTE_CHOICES: [&str; 12] = [
    "00", "05", "10", "15", "20", "25", "30", "35", "40", "45", "50", "55",
];
pub const DURATION_CHOICES: [u32; 6] = [1, 2, 3, 4, 5, 6];
pub const STATUS_CHOICES: [&str; 3] = ["Attending", "Tentative", "Unregister"];

// Option type discriminants from the platform's interaction schema.
const OPTION_STRING: u8 = 3;
const OPTION_INTEGER: u8 = 4;
const OPTION_CHANNEL: u8 = 7;
const OPTION_ROLE: u8 = 8;

pub fn command_schema() -> Value {
    json!([
        {
            "name": "ping",
            "description": "Check that the bot is responsive",
            "options": []
        },
        {
            "name": "new_event",
            "description": "Create a new event",
            "options": new_event_options()
        },
        {
            "name": "event_signup",
            "description": "Register for the event in this thread",
            "options": [
                {
                    "type": OPTION_STRING,
                    "name": "job",
                    "description": "Select the job you will attend as",
                    "required": true,
                    "choices": job_choices()
                },
                {
                    "type": OPTION_STRING,
                    "name": "status",
                    "description": "Attending status.",
                    "required": true,
                    "choices": string_choices(&STATUS_CHOICES)
                }
            ]
        },
        {
            "name": "edit_event",
            "description": "Edit the event in this thread",
            "options": schedule_options()
        }
    ])
}

fn new_event_options() -> Vec<Value> {
    let mut options = vec![
        json!({
            "type": OPTION_STRING,
            "name": "event_name",
            "description": "Event name",
            "required": true
        }),
        json!({
            "type": OPTION_STRING,
            "name": "description",
            "description": "Event description",
            "required": true
        }),
    ];
    options.extend(schedule_options());
    options
}

/// The schedule arguments shared by event creation and event edit.
fn schedule_options() -> Vec<Value> {
    vec![
        json!({
            "type": OPTION_STRING,
            "name": "date",
            "description": "Date of the event in MM-dd format (Example: 5-23)",
            "required": true
        }),
        json!({
            "type": OPTION_INTEGER,
            "name": "hour",
            "description": "hour",
            "required": true,
            "choices": (1..=12).map(|h| json!({"name": h.to_string(), "value": h})).collect::<Vec<_>>()
        }),
        json!({
            "type": OPTION_STRING,
            "name": "minute",
            "description": "minute",
            "required": true,
            "choices": string_choices(&MINUTE_CHOICES)
        }),
        json!({
            "type": OPTION_STRING,
            "name": "am_pm",
            "description": "AM/PM",
            "required": true,
            "choices": string_choices(&["AM", "PM"])
        }),
        json!({
            "type": OPTION_INTEGER,
            "name": "duration",
            "description": "Duration of the event in HOURS",
            "required": true,
            "choices": DURATION_CHOICES.map(|d| json!({"name": d.to_string(), "value": d})).to_vec()
        }),
        json!({
            "type": OPTION_CHANNEL,
            "name": "location",
            "description": "Voice channel for the event",
            "required": true
        }),
        json!({
            "type": OPTION_ROLE,
            "name": "ping_role",
            "description": "Choose a role to ping",
            "required": true
        }),
    ]
}

fn job_choices() -> Vec<Value> {
    Job::ALL
        .iter()
        .map(|job| json!({"name": job.code(), "value": job.code()}))
        .collect()
}

fn string_choices(values: &[&str]) -> Vec<Value> {
    values
        .iter()
        .map(|value| json!({"name": value, "value": value}))
        .collect()
}
