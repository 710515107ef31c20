use anyhow::{Error, Result};
use chrono::{DateTime, FixedOffset, Utc};
use handlebars::Handlebars;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use super::models::{ConversationState, Transcript, TranscriptEvent};
use crate::ai::events::{EventDraft, build_events};
use crate::ai::extract::{Extraction, extract_json, into_items};
use crate::ai::prompt::{Prompt, templates};
use crate::core::AppConfig;
use crate::google::gcal::{BoxedCalendarGateway, CreatedEvent};
use crate::openai::{BoxedCompletionGateway, Message, Role};

pub const GREETING: &str = "What are you planning?";
pub const CONFIRM_PROMPT: &str = "Should I add these events to your calendar? Answer \"yes\" to create them, \"exit\" to start over, or tell me what to change.";
pub const NEW_PLAN_PROMPT: &str = "Okay, let's start over. What are you planning?";

/// Turns a plan written in plain language into calendar events.
///
/// The conversation has two states. In `Create` the next input is a
/// plan that gets sent to the model with the planning prompt. In
/// `Specify` the model has proposed events and the input is either
/// "yes" to create them, "exit" to throw them away, or anything else to
/// refine the proposal.
///
/// Everything the user should see is sent through the `tx` channel as
/// `TranscriptEvent`s. Use `PlannerBuilder` to construct a `Planner`.
pub struct Planner {
    completion: BoxedCompletionGateway,
    calendar: BoxedCalendarGateway,
    tx: mpsc::UnboundedSender<TranscriptEvent>,
    templates: Handlebars<'static>,
    system_message: String,
    utc_offset: FixedOffset,
    calendar_id: String,
    max_repair_attempts: usize,
    state: ConversationState,
    transcript: Transcript,
}

impl Planner {
    pub fn state(&self) -> ConversationState {
        self.state
    }

    /// Messages exchanged with the model since the last reset, without
    /// the system prompt.
    pub fn history(&self) -> Vec<Message> {
        self.transcript.messages()
    }

    pub fn greet(&self) {
        self.emit(TranscriptEvent::System(GREETING.to_string()));
    }

    /// Handle one line of user input. Inputs are processed one at a time
    /// since this takes `&mut self`.
    pub async fn handle_input(&mut self, input: &str) -> Result<()> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(());
        }

        match self.state {
            ConversationState::Create => self.plan(input).await,
            ConversationState::Specify => match input.to_lowercase().as_str() {
                "exit" => {
                    self.reset();
                    self.emit(TranscriptEvent::System(NEW_PLAN_PROMPT.to_string()));
                    Ok(())
                }
                "yes" => self.confirm().await,
                _ => {
                    self.refine(input).await;
                    Ok(())
                }
            },
        }
    }

    fn emit(&self, event: TranscriptEvent) {
        // The receiver going away only means nobody is watching
        if self.tx.send(event).is_err() {
            tracing::debug!("Transcript receiver dropped");
        }
    }

    fn reset(&mut self) {
        self.transcript.clear();
        self.state = ConversationState::Create;
    }

    fn request_messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.transcript.len() + 1);
        messages.push(Message::new(Role::System, &self.system_message));
        messages.extend(self.transcript.messages());
        messages
    }

    /// Send `content` as the next user turn and stream the reply. On
    /// failure the user turn is removed again so the history only ever
    /// holds complete exchanges.
    async fn exchange(&mut self, content: &str) -> Result<String, Error> {
        self.transcript.push(Message::new(Role::User, content));
        let messages = self.request_messages();

        let (delta_tx, mut delta_rx) = mpsc::unbounded_channel::<String>();
        let events = self.tx.clone();
        let forward = async move {
            while let Some(delta) = delta_rx.recv().await {
                let _ = events.send(TranscriptEvent::AssistantDelta(delta));
            }
        };

        self.emit(TranscriptEvent::AssistantStart);
        let (result, _) = tokio::join!(self.completion.stream(&messages, delta_tx), forward);
        self.emit(TranscriptEvent::AssistantEnd);

        match result {
            Ok(reply) => {
                self.transcript.push(Message::new(Role::Assistant, &reply));
                Ok(reply)
            }
            Err(e) => {
                self.transcript.pop();
                Err(e)
            }
        }
    }

    fn model_failure(&self, e: &Error) {
        tracing::error!("Completion failed: {}", e);
        self.emit(TranscriptEvent::System(format!(
            "Sorry, something went wrong talking to the model: {}",
            e
        )));
    }

    async fn plan(&mut self, plan: &str) -> Result<()> {
        let now = Utc::now().with_timezone(&self.utc_offset);
        let prompt = self.render_plan_prompt(plan, &now)?;

        match self.exchange(&prompt).await {
            Ok(_) => {
                self.state = ConversationState::Specify;
                self.emit(TranscriptEvent::System(CONFIRM_PROMPT.to_string()));
            }
            Err(e) => self.model_failure(&e),
        }
        Ok(())
    }

    fn render_plan_prompt(&self, plan: &str, now: &DateTime<FixedOffset>) -> Result<String> {
        let prompt = self.templates.render(
            &Prompt::PlanEvents.to_string(),
            &json!({
                "weekday": now.format("%A").to_string(),
                "date": now.format("%Y-%m-%d").to_string(),
                "time": now.format("%H:%M").to_string(),
                "offset": now.format("%:z").to_string(),
                "plan": plan,
            }),
        )?;
        Ok(prompt)
    }

    async fn refine(&mut self, input: &str) {
        match self.exchange(input).await {
            Ok(_) => self.emit(TranscriptEvent::System(CONFIRM_PROMPT.to_string())),
            Err(e) => self.model_failure(&e),
        }
    }

    async fn confirm(&mut self) -> Result<()> {
        let reply = self
            .transcript
            .last_assistant()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let items = self
            .extract_with_repair(reply)
            .await
            .map(into_items)
            .unwrap_or_default();
        let drafts = build_events(&items, &self.utc_offset, &Utc::now());

        if drafts.is_empty() {
            self.emit(TranscriptEvent::System(
                "I couldn't find any events to add. What are you planning?".to_string(),
            ));
            self.reset();
            return Ok(());
        }

        let message = match self.create_events(&drafts).await {
            Ok(results) => summarize(&drafts, &results),
            Err(e) => {
                tracing::error!("Failed to create events: {}", e);
                format!("Failed to create events: {}", e)
            }
        };
        self.emit(TranscriptEvent::System(message));
        self.reset();
        Ok(())
    }

    async fn create_events(
        &self,
        drafts: &[EventDraft],
    ) -> Result<Vec<Result<CreatedEvent, Error>>, Error> {
        let credential = self.calendar.authorize().await?;
        self.calendar
            .create_events(&credential, drafts, &self.calendar_id)
            .await
    }

    /// Extract the JSON payload from `reply`. When it's malformed the
    /// model is asked to fix it, at most `max_repair_attempts` times.
    async fn extract_with_repair(&mut self, reply: String) -> Option<Value> {
        let mut candidate = reply;
        let mut attempts = 0;

        loop {
            match extract_json(&candidate) {
                Extraction::Parsed(value) => return Some(value),
                Extraction::Missing => {
                    tracing::warn!("No JSON block found in reply");
                    return None;
                }
                Extraction::Malformed { json, error } => {
                    if attempts >= self.max_repair_attempts {
                        tracing::warn!("Giving up on malformed JSON after {} repair(s): {}", attempts, error);
                        return None;
                    }
                    attempts += 1;
                    tracing::warn!("Malformed JSON, asking for a repair: {}", error);
                    self.emit(TranscriptEvent::System(
                        "The events came back garbled, asking for a corrected version.".to_string(),
                    ));

                    let prompt = match self.templates.render(
                        &Prompt::RepairJson.to_string(),
                        &json!({"json": json, "error": error}),
                    ) {
                        Ok(prompt) => prompt,
                        Err(e) => {
                            tracing::error!("Failed to render repair prompt: {}", e);
                            return None;
                        }
                    };

                    match self.exchange(&prompt).await {
                        Ok(repaired) => candidate = repaired,
                        Err(e) => {
                            self.model_failure(&e);
                            return None;
                        }
                    }
                }
            }
        }
    }
}

fn summarize(drafts: &[EventDraft], results: &[Result<CreatedEvent, Error>]) -> String {
    let mut created = Vec::new();
    let mut failed = Vec::new();
    for (draft, result) in drafts.iter().zip(results) {
        match result {
            Ok(event) => created.push(match &event.html_link {
                Some(link) => format!("{} ({})", draft.summary, link),
                None => draft.summary.clone(),
            }),
            Err(_) => failed.push(draft.summary.as_str()),
        }
    }

    let mut message = if created.is_empty() {
        "No events were created.".to_string()
    } else {
        format!("Created {} event(s): {}.", created.len(), created.join(", "))
    };
    if !failed.is_empty() {
        message.push_str(&format!(" Failed to create: {}.", failed.join(", ")));
    }
    message
}

pub struct PlannerBuilder {
    completion: BoxedCompletionGateway,
    calendar: BoxedCalendarGateway,
    tx: mpsc::UnboundedSender<TranscriptEvent>,
    system_message: String,
    utc_offset: FixedOffset,
    calendar_id: String,
    max_repair_attempts: usize,
}

impl PlannerBuilder {
    pub fn new(
        completion: BoxedCompletionGateway,
        calendar: BoxedCalendarGateway,
        tx: mpsc::UnboundedSender<TranscriptEvent>,
    ) -> Self {
        Self {
            completion,
            calendar,
            tx,
            system_message: "You are a helpful planning assistant.".to_string(),
            utc_offset: FixedOffset::east_opt(2 * 3600).expect("Valid UTC offset"),
            calendar_id: "primary".to_string(),
            max_repair_attempts: 1,
        }
    }

    /// Takes the system message, offset, calendar, and repair limit
    /// from the app config.
    pub fn config(self, config: &AppConfig) -> Self {
        self.system_message(&config.system_message)
            .utc_offset(config.utc_offset)
            .calendar_id(&config.calendar_id)
            .max_repair_attempts(config.max_repair_attempts)
    }

    pub fn system_message(mut self, system_message: &str) -> Self {
        self.system_message = system_message.to_string();
        self
    }

    pub fn utc_offset(mut self, utc_offset: FixedOffset) -> Self {
        self.utc_offset = utc_offset;
        self
    }

    pub fn calendar_id(mut self, calendar_id: &str) -> Self {
        self.calendar_id = calendar_id.to_string();
        self
    }

    pub fn max_repair_attempts(mut self, max_repair_attempts: usize) -> Self {
        self.max_repair_attempts = max_repair_attempts;
        self
    }

    pub fn build(self) -> Planner {
        Planner {
            completion: self.completion,
            calendar: self.calendar,
            tx: self.tx,
            templates: templates(),
            system_message: self.system_message,
            utc_offset: self.utc_offset,
            calendar_id: self.calendar_id,
            max_repair_attempts: self.max_repair_attempts,
            state: ConversationState::Create,
            transcript: Transcript::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use anyhow::anyhow;
    use async_trait::async_trait;

    use crate::google::gcal::{CalendarGateway, CalendarSummary};
    use crate::google::oauth::Credential;
    use crate::openai::CompletionGateway;

    type Requests = Arc<Mutex<Vec<Vec<Message>>>>;
    type CalendarCalls = Arc<Mutex<Vec<(Vec<EventDraft>, String)>>>;

    struct ScriptedCompletion {
        replies: Mutex<VecDeque<Result<String, Error>>>,
        requests: Requests,
    }

    #[async_trait]
    impl CompletionGateway for ScriptedCompletion {
        async fn stream(
            &self,
            messages: &[Message],
            tx: mpsc::UnboundedSender<String>,
        ) -> Result<String, Error> {
            self.requests.lock().unwrap().push(messages.to_vec());
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow!("No scripted reply left")))?;
            let mid = reply.len() / 2;
            let mid = (0..=mid).rev().find(|i| reply.is_char_boundary(*i)).unwrap();
            tx.send(reply[..mid].to_string()).unwrap();
            tx.send(reply[mid..].to_string()).unwrap();
            Ok(reply)
        }
    }

    struct RecordingCalendar {
        calls: CalendarCalls,
        fail_authorize: bool,
        fail_summaries: Vec<String>,
    }

    #[async_trait]
    impl CalendarGateway for RecordingCalendar {
        async fn authorize(&self) -> Result<Credential, Error> {
            if self.fail_authorize {
                return Err(anyhow!("No client secrets found"));
            }
            Ok(Credential::authorized_user("id", "secret", "refresh"))
        }

        async fn list_calendars(
            &self,
            _credential: &Credential,
        ) -> Result<Vec<CalendarSummary>, Error> {
            Ok(vec![])
        }

        async fn create_events(
            &self,
            _credential: &Credential,
            drafts: &[EventDraft],
            calendar_id: &str,
        ) -> Result<Vec<Result<CreatedEvent, Error>>, Error> {
            self.calls
                .lock()
                .unwrap()
                .push((drafts.to_vec(), calendar_id.to_string()));
            Ok(drafts
                .iter()
                .map(|d| {
                    if self.fail_summaries.contains(&d.summary) {
                        Err(anyhow!("Bad Request"))
                    } else {
                        Ok(CreatedEvent {
                            id: d.summary.to_lowercase(),
                            summary: Some(d.summary.clone()),
                            html_link: None,
                        })
                    }
                })
                .collect())
        }
    }

    struct Harness {
        planner: Planner,
        rx: mpsc::UnboundedReceiver<TranscriptEvent>,
        requests: Requests,
        calls: CalendarCalls,
    }

    impl Harness {
        fn events(&mut self) -> Vec<TranscriptEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.rx.try_recv() {
                events.push(event);
            }
            events
        }

        fn system_messages(&mut self) -> Vec<String> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    TranscriptEvent::System(msg) => Some(msg),
                    _ => None,
                })
                .collect()
        }
    }

    fn harness_with(
        replies: Vec<Result<String, Error>>,
        fail_authorize: bool,
        fail_summaries: &[&str],
    ) -> Harness {
        let requests: Requests = Arc::new(Mutex::new(Vec::new()));
        let calls: CalendarCalls = Arc::new(Mutex::new(Vec::new()));
        let completion = ScriptedCompletion {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Arc::clone(&requests),
        };
        let calendar = RecordingCalendar {
            calls: Arc::clone(&calls),
            fail_authorize,
            fail_summaries: fail_summaries.iter().map(|s| s.to_string()).collect(),
        };
        let (tx, rx) = mpsc::unbounded_channel();
        let planner = PlannerBuilder::new(Box::new(completion), Box::new(calendar), tx)
            .system_message("You plan things.")
            .calendar_id("work@group.calendar.google.com")
            .build();

        Harness {
            planner,
            rx,
            requests,
            calls,
        }
    }

    fn harness(replies: Vec<Result<String, Error>>) -> Harness {
        harness_with(replies, false, &[])
    }

    const PROPOSAL: &str = r#"Two events for you.

```json
[
  {"summary": "Dentist", "start": "2030-03-04T10:00:00", "end": "2030-03-04T11:00:00", "allDay": false},
  {"summary": "Conference", "start": "2030-03-05", "end": "2030-03-07", "allDay": true, "color": "sage"}
]
```"#;

    const MALFORMED: &str = "Here you go\n```json\n[{\"summary\": \"Dentist\",}]\n```";

    const REPAIRED: &str = "```json\n[{\"summary\": \"Dentist\", \"start\": \"2030-03-04\", \"end\": \"2030-03-05\", \"allDay\": true}]\n```";

    #[tokio::test]
    async fn test_plan_moves_to_specify() {
        let mut h = harness(vec![Ok(PROPOSAL.to_string())]);
        h.planner.handle_input("Dentist on Monday at 10").await.unwrap();

        assert_eq!(h.planner.state(), ConversationState::Specify);

        let requests = h.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0][0].role(), Role::System);
        assert_eq!(requests[0][0].content, "You plan things.");
        assert_eq!(requests[0][1].role(), Role::User);
        assert!(requests[0][1].content.contains("PLAN:\nDentist on Monday at 10"));

        let history = h.planner.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, PROPOSAL);

        let events = h.events();
        assert_eq!(events.first(), Some(&TranscriptEvent::AssistantStart));
        let streamed: String = events
            .iter()
            .filter_map(|e| match e {
                TranscriptEvent::AssistantDelta(d) => Some(d.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(streamed, PROPOSAL);
        assert!(events.contains(&TranscriptEvent::AssistantEnd));
        assert_eq!(
            events.last(),
            Some(&TranscriptEvent::System(CONFIRM_PROMPT.to_string()))
        );
    }

    #[tokio::test]
    async fn test_exit_resets() {
        let mut h = harness(vec![Ok(PROPOSAL.to_string())]);
        h.planner.handle_input("Dentist on Monday").await.unwrap();
        h.events();

        h.planner.handle_input("  Exit ").await.unwrap();
        assert_eq!(h.planner.state(), ConversationState::Create);
        assert!(h.planner.history().is_empty());
        assert_eq!(h.system_messages(), vec![NEW_PLAN_PROMPT.to_string()]);
        assert!(h.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_yes_creates_events() {
        let mut h = harness(vec![Ok(PROPOSAL.to_string())]);
        h.planner.handle_input("Dentist and a conference").await.unwrap();
        h.events();

        h.planner.handle_input("YES").await.unwrap();

        let calls = h.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 1);
        let (drafts, calendar_id) = &calls[0];
        assert_eq!(calendar_id, "work@group.calendar.google.com");
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].summary, "Dentist");
        assert_eq!(
            drafts[0].start.as_ref().unwrap().value(),
            Some("2030-03-04T10:00:00+02:00")
        );
        assert_eq!(drafts[1].start.as_ref().unwrap().value(), Some("2030-03-05"));
        assert_eq!(drafts[1].color_id.as_deref(), Some("2"));

        assert_eq!(h.planner.state(), ConversationState::Create);
        assert!(h.planner.history().is_empty());
        assert_eq!(
            h.system_messages(),
            vec!["Created 2 event(s): Dentist, Conference.".to_string()]
        );
        // Only the plan itself went to the model
        assert_eq!(h.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_refinement_stays_in_specify() {
        let mut h = harness(vec![Ok("First draft".to_string()), Ok(PROPOSAL.to_string())]);
        h.planner.handle_input("Dentist").await.unwrap();
        h.planner.handle_input("Make it 10am instead").await.unwrap();

        assert_eq!(h.planner.state(), ConversationState::Specify);
        let requests = h.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 2);
        // system + plan + reply + refinement
        assert_eq!(requests[1].len(), 4);
        assert_eq!(requests[1][3].content, "Make it 10am instead");
        assert_eq!(h.planner.history().len(), 4);

        // The latest proposal is the one that gets created
        h.planner.handle_input("yes").await.unwrap();
        assert_eq!(h.calls.lock().unwrap()[0].0.len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_json_is_repaired_once() {
        let mut h = harness(vec![Ok(MALFORMED.to_string()), Ok(REPAIRED.to_string())]);
        h.planner.handle_input("Dentist").await.unwrap();
        h.planner.handle_input("yes").await.unwrap();

        let requests = h.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 2);
        let repair = &requests[1].last().unwrap().content;
        assert!(repair.contains(r#"[{"summary": "Dentist",}]"#));

        let calls = h.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0[0].summary, "Dentist");
        assert_eq!(h.planner.state(), ConversationState::Create);
    }

    #[tokio::test]
    async fn test_malformed_json_gives_up_after_one_repair() {
        let mut h = harness(vec![Ok(MALFORMED.to_string()), Ok(MALFORMED.to_string())]);
        h.planner.handle_input("Dentist").await.unwrap();
        h.planner.handle_input("yes").await.unwrap();

        assert_eq!(h.requests.lock().unwrap().len(), 2);
        assert!(h.calls.lock().unwrap().is_empty());
        assert_eq!(h.planner.state(), ConversationState::Create);
        assert!(h.planner.history().is_empty());
    }

    #[tokio::test]
    async fn test_no_repair_when_disabled() {
        let requests: Requests = Arc::new(Mutex::new(Vec::new()));
        let calls: CalendarCalls = Arc::new(Mutex::new(Vec::new()));
        let completion = ScriptedCompletion {
            replies: Mutex::new(VecDeque::from(vec![Ok(MALFORMED.to_string())])),
            requests: Arc::clone(&requests),
        };
        let calendar = RecordingCalendar {
            calls: Arc::clone(&calls),
            fail_authorize: false,
            fail_summaries: vec![],
        };
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut planner = PlannerBuilder::new(Box::new(completion), Box::new(calendar), tx)
            .max_repair_attempts(0)
            .build();

        planner.handle_input("Dentist").await.unwrap();
        planner.handle_input("yes").await.unwrap();
        assert_eq!(requests.lock().unwrap().len(), 1);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_json_creates_nothing() {
        let mut h = harness(vec![Ok("What time is the dentist?".to_string())]);
        h.planner.handle_input("Dentist").await.unwrap();
        h.events();
        h.planner.handle_input("yes").await.unwrap();

        assert!(h.calls.lock().unwrap().is_empty());
        assert_eq!(h.requests.lock().unwrap().len(), 1);
        assert_eq!(h.planner.state(), ConversationState::Create);
        assert_eq!(h.system_messages().len(), 1);
    }

    #[tokio::test]
    async fn test_model_failure_keeps_state() {
        let mut h = harness(vec![Err(anyhow!("connection refused"))]);
        h.planner.handle_input("Dentist").await.unwrap();

        assert_eq!(h.planner.state(), ConversationState::Create);
        assert!(h.planner.history().is_empty());
        let messages = h.system_messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("connection refused"));
    }

    #[tokio::test]
    async fn test_refinement_failure_keeps_proposal() {
        let mut h = harness(vec![Ok(PROPOSAL.to_string()), Err(anyhow!("timeout"))]);
        h.planner.handle_input("Dentist").await.unwrap();
        h.planner.handle_input("Move it to 11").await.unwrap();

        assert_eq!(h.planner.state(), ConversationState::Specify);
        assert_eq!(h.planner.history().len(), 2);

        h.planner.handle_input("yes").await.unwrap();
        assert_eq!(h.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_authorize_failure_still_resets() {
        let mut h = harness_with(vec![Ok(PROPOSAL.to_string())], true, &[]);
        h.planner.handle_input("Dentist").await.unwrap();
        h.events();
        h.planner.handle_input("yes").await.unwrap();

        assert!(h.calls.lock().unwrap().is_empty());
        assert_eq!(h.planner.state(), ConversationState::Create);
        assert!(h.planner.history().is_empty());
        let messages = h.system_messages();
        assert!(messages[0].starts_with("Failed to create events"));
    }

    #[tokio::test]
    async fn test_partial_failure_reports_both() {
        let mut h = harness_with(vec![Ok(PROPOSAL.to_string())], false, &["Dentist"]);
        h.planner.handle_input("Dentist").await.unwrap();
        h.events();
        h.planner.handle_input("yes").await.unwrap();

        assert_eq!(
            h.system_messages(),
            vec!["Created 1 event(s): Conference. Failed to create: Dentist.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let mut h = harness(vec![]);
        h.planner.handle_input("   ").await.unwrap();
        assert!(h.requests.lock().unwrap().is_empty());
        assert!(h.events().is_empty());
    }

    #[test]
    fn test_render_plan_prompt() {
        let h = harness(vec![]);
        let now = DateTime::parse_from_rfc3339("2024-05-15T09:30:00+02:00").unwrap();
        let prompt = h.planner.render_plan_prompt("Lunch tomorrow", &now).unwrap();
        assert!(prompt.starts_with("Today is Wednesday, 2024-05-15 and the current time is 09:30 (UTC+02:00)."));
        assert!(prompt.ends_with("PLAN:\nLunch tomorrow\n"));
    }
}
