//! Reusable prompts using Handlebars for templating. Strict mode makes a
//! missing variable an error instead of an empty string, and escaping
//! is turned off because the output goes to a model, not a browser.

use std::fmt;

use handlebars::Handlebars;

#[derive(Debug)]
pub enum Prompt {
    PlanEvents,
    RepairJson,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

const PLAN_EVENTS_PROMPT: &str = r#"Today is {{weekday}}, {{date}} and the current time is {{time}} (UTC{{offset}}).

Turn the plan below (PLAN) into calendar events. First describe the events in one or two short sentences, then give all of them in a single ```json fenced code block containing an array of objects with these keys:
- "summary": short title of the event
- "description": one sentence about the event
- "start": "YYYY-MM-DD" for all day events, otherwise "YYYY-MM-DDTHH:MM:SS" in local time without an offset
- "end": same format as "start"; for all day events the day after the last day
- "allDay": true or false
- "location": optional, where the event takes place
- "recurrence": optional, a list of RRULE strings
- "reminders": optional, a list of {"method": "popup" or "email", "minutes": minutes before the event}
- "color": optional, a color name such as "lavender", "sage", "tomato" or "blueberry"

Resolve relative dates like "tomorrow" or "next friday" against today's date.

PLAN:
{{plan}}
"#;

const REPAIR_JSON_PROMPT: &str = r#"The JSON in your last reply could not be parsed.

ERROR:
{{error}}

JSON:
{{json}}

Reply with the corrected JSON in a single ```json fenced code block and keep the same events."#;

pub fn templates<'a>() -> Handlebars<'a> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry.register_escape_fn(handlebars::no_escape);
    registry
        .register_template_string(&Prompt::PlanEvents.to_string(), PLAN_EVENTS_PROMPT)
        .expect("Failed to register template");
    registry
        .register_template_string(&Prompt::RepairJson.to_string(), REPAIR_JSON_PROMPT)
        .expect("Failed to register template");
    registry
}
