use std::sync::Arc;
use std::time::Duration;

use dsagpt_core::events::{self, EventReceiver};
use dsagpt_core::testing::{
    MockHistory, MockIdentity, MockInference, ScriptHandle, ScriptedRecognizer,
};
use dsagpt_core::{
    ChatEvent, ChatServices, DictationState, Exchange, Identity, Message, ServiceError,
    SpeechUpdate, TurnOrchestrator, TurnSettings, TurnState,
};
use reqwest::StatusCode;
use tokio::sync::mpsc;

struct Harness {
    chat: TurnOrchestrator,
    events: EventReceiver,
    inference: Arc<MockInference>,
    history: Arc<MockHistory>,
    saved: mpsc::UnboundedReceiver<Exchange>,
    mic: ScriptHandle,
}

fn harness_with(delay: Duration, identity: MockIdentity) -> Harness {
    let inference = Arc::new(MockInference::new());
    let (history, saved) = MockHistory::new();
    let history = Arc::new(history);
    let (recognizer, mic) = ScriptedRecognizer::new();
    let (tx, events) = events::channel();

    let chat = TurnOrchestrator::new(
        ChatServices {
            inference: inference.clone(),
            history: history.clone(),
            identity: Arc::new(identity),
            recognizer: Box::new(recognizer),
        },
        TurnSettings {
            reply_delay: delay,
            ..TurnSettings::default()
        },
        tx,
    );

    Harness {
        chat,
        events,
        inference,
        history,
        saved,
        mic,
    }
}

fn harness() -> Harness {
    harness_with(Duration::ZERO, MockIdentity::anonymous())
}

impl Harness {
    fn type_text(&mut self, text: &str) {
        let input = self.chat.edit_input().expect("input should be editable");
        input.clear();
        for c in text.chars() {
            input.insert_char(c);
        }
    }

    /// Wait for the next event and feed it back, as the host loop does
    async fn pump(&mut self) {
        let event = tokio::time::timeout(Duration::from_secs(5), self.events.recv())
            .await
            .expect("timed out waiting for an event")
            .expect("event channel closed");
        self.chat.handle_event(event);
    }

    async fn next_saved(&mut self) -> Exchange {
        tokio::time::timeout(Duration::from_secs(5), self.saved.recv())
            .await
            .expect("timed out waiting for persistence")
            .expect("history channel closed")
    }
}

#[tokio::test]
async fn test_binary_search_scenario() {
    let mut h = harness();
    h.inference.queue_reply("It's O(log n)...");

    h.type_text("Explain binary search complexity");
    assert!(h.chat.submit_turn().is_some());
    assert_eq!(
        h.chat.conversation().messages(),
        &[Message::user("Explain binary search complexity")]
    );
    assert!(h.chat.is_awaiting_reply());

    h.pump().await;
    assert_eq!(
        h.chat.conversation().messages(),
        &[
            Message::user("Explain binary search complexity"),
            Message::bot("It's O(log n)..."),
        ]
    );
    assert_eq!(h.chat.turn_state(), &TurnState::Idle);
    assert_eq!(h.inference.requests(), vec!["Explain binary search complexity"]);

    let saved = h.next_saved().await;
    assert_eq!(
        saved,
        Exchange {
            user_message: "Explain binary search complexity".to_string(),
            bot_message: "It's O(log n)...".to_string(),
            user_id: None,
        }
    );
    tokio::task::yield_now().await;
    assert_eq!(h.history.calls(), 1);
}

#[tokio::test]
async fn test_rapid_second_submit_is_dropped() {
    let mut h = harness();
    h.inference.queue_reply("reply to a");
    h.inference.queue_reply("reply to b");

    h.type_text("a");
    assert!(h.chat.submit_turn().is_some());
    h.type_text("b");
    assert_eq!(h.chat.submit_turn(), None);
    // The rejected input is left for the user
    assert_eq!(h.chat.input().text(), "b");

    h.pump().await;
    assert_eq!(
        h.chat.conversation().messages(),
        &[Message::user("a"), Message::bot("reply to a")]
    );
    assert_eq!(h.inference.requests(), vec!["a"]);
}

#[tokio::test]
async fn test_inference_failure_keeps_user_message_only() {
    let mut h = harness();
    h.inference.queue_error(ServiceError::Status {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: "boom".to_string(),
    });

    h.type_text("What is a heap?");
    h.chat.submit_turn();
    h.pump().await;

    assert_eq!(h.chat.conversation().messages(), &[Message::user("What is a heap?")]);
    assert_eq!(h.chat.turn_state(), &TurnState::Idle);
    assert!(!h.chat.is_awaiting_reply());

    tokio::task::yield_now().await;
    assert_eq!(h.history.calls(), 0);
    assert!(h.saved.try_recv().is_err());
}

#[tokio::test]
async fn test_next_turn_works_after_failure() {
    let mut h = harness();
    h.inference
        .queue_error(ServiceError::Malformed("missing field `response`".to_string()));
    h.inference.queue_reply("second time lucky");

    h.type_text("first");
    h.chat.submit_turn();
    h.pump().await;

    h.type_text("second");
    assert!(h.chat.submit_turn().is_some());
    h.pump().await;

    let texts: Vec<&str> = h
        .chat
        .conversation()
        .messages()
        .iter()
        .map(|m| m.text())
        .collect();
    assert_eq!(texts, vec!["first", "second", "second time lucky"]);
    assert_eq!(h.next_saved().await.user_message, "second");
}

#[tokio::test]
async fn test_persistence_failure_does_not_affect_chat() {
    let inference = Arc::new(MockInference::new());
    let (history, mut saved) = MockHistory::failing();
    let (recognizer, _mic) = ScriptedRecognizer::new();
    let (tx, mut rx) = events::channel();
    let mut chat = TurnOrchestrator::new(
        ChatServices {
            inference: inference.clone(),
            history: Arc::new(history),
            identity: Arc::new(MockIdentity::anonymous()),
            recognizer: Box::new(recognizer),
        },
        TurnSettings {
            reply_delay: Duration::ZERO,
            ..TurnSettings::default()
        },
        tx,
    );
    inference.queue_reply("one");
    inference.queue_reply("two");

    for question in ["q1", "q2"] {
        chat.edit_input().unwrap().set(question);
        assert!(chat.submit_turn().is_some());
        let event = rx.recv().await.unwrap();
        chat.handle_event(event);
        assert!(saved.recv().await.is_some());
    }
    assert_eq!(chat.conversation().len(), 4);
    assert_eq!(chat.turn_state(), &TurnState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_reply_is_held_for_minimum_delay() {
    let mut h = harness_with(Duration::from_millis(1000), MockIdentity::anonymous());
    h.inference.queue_reply("done");

    h.type_text("slow please");
    let started = tokio::time::Instant::now();
    h.chat.submit_turn();
    h.pump().await;

    assert!(started.elapsed() >= Duration::from_millis(1000));
    assert_eq!(h.chat.conversation().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failure_is_not_delayed() {
    let mut h = harness_with(Duration::from_millis(1000), MockIdentity::anonymous());
    h.inference
        .queue_error(ServiceError::Malformed("bad body".to_string()));

    h.type_text("fail fast");
    let started = tokio::time::Instant::now();
    h.chat.submit_turn();
    h.pump().await;

    assert!(started.elapsed() < Duration::from_millis(1000));
    assert_eq!(h.chat.turn_state(), &TurnState::Idle);
}

#[tokio::test]
async fn test_dictation_mirrors_transcript_then_releases_input() {
    let mut h = harness();
    h.chat.start_dictation().unwrap();
    assert_eq!(h.chat.dictation_state(), DictationState::Listening);

    for partial in ["sort", "sorting", "sorting algo"] {
        assert!(h.mic.emit(SpeechUpdate::Interim(partial.to_string())));
        h.pump().await;
    }
    assert_eq!(h.chat.input().text(), "sorting algo");

    h.chat.stop_dictation();
    assert_eq!(h.mic.stops(), 1);
    h.chat.edit_input().unwrap().insert_char('s');
    assert_eq!(h.chat.input().text(), "sorting algos");

    // A late update from the stopped session must not clobber manual edits
    assert!(h.mic.emit(SpeechUpdate::Interim("sorting algorithm".to_string())));
    h.pump().await;
    assert_eq!(h.chat.input().text(), "sorting algos");
}

#[tokio::test]
async fn test_dictated_message_is_a_snapshot() {
    let mut h = harness();
    h.inference.queue_reply("Linked lists are...");
    h.chat.start_dictation().unwrap();

    h.mic.emit(SpeechUpdate::Final("explain linked lists".to_string()));
    h.pump().await;
    assert!(h.chat.submit_turn().is_some());
    assert!(h.chat.input().is_empty());

    // Still listening: new speech fills the cleared input, not the sent message
    h.mic.emit(SpeechUpdate::Interim("and arrays".to_string()));
    h.pump().await;
    assert_eq!(h.chat.input().text(), "and arrays");
    assert_eq!(
        h.chat.conversation().messages()[0],
        Message::user("explain linked lists")
    );

    h.pump().await;
    assert_eq!(h.chat.conversation().len(), 2);
    assert_eq!(h.chat.conversation().messages()[0].text(), "explain linked lists");
}

#[tokio::test]
async fn test_submit_resets_transcript() {
    let mut h = harness();
    h.inference.queue_reply("ok");
    h.chat.start_dictation().unwrap();
    h.mic.emit(SpeechUpdate::Final("first thought".to_string()));
    h.pump().await;
    h.chat.submit_turn();

    h.mic.emit(SpeechUpdate::Final("second".to_string()));
    h.pump().await;
    assert_eq!(h.chat.input().text(), "second");
}

#[tokio::test]
async fn test_identity_tags_exchanges() {
    let mut h = harness_with(
        Duration::ZERO,
        MockIdentity::signed_in(Identity::new("user-42")),
    );
    h.chat.resolve_identity();
    h.pump().await;
    assert_eq!(h.chat.identity().map(|i| i.id.as_str()), Some("user-42"));

    h.inference.queue_reply("Use a queue.");
    h.type_text("How does BFS work?");
    h.chat.submit_turn();
    h.pump().await;

    assert_eq!(h.next_saved().await.user_id.as_deref(), Some("user-42"));
}

#[tokio::test]
async fn test_identity_failure_leaves_user_id_null() {
    let mut h = harness();
    h.chat.resolve_identity();
    h.pump().await;
    assert!(h.chat.identity().is_none());

    h.inference.queue_reply("Recursion is...");
    h.type_text("What is recursion?");
    h.chat.submit_turn();
    h.pump().await;

    assert_eq!(h.chat.conversation().len(), 2);
    assert_eq!(h.next_saved().await.user_id, None);
}

#[tokio::test]
async fn test_unsupported_dictation_is_reported() {
    let (recognizer, mic) = ScriptedRecognizer::unsupported();
    let (history, _saved) = MockHistory::new();
    let (tx, _rx) = events::channel();
    let mut chat = TurnOrchestrator::new(
        ChatServices {
            inference: Arc::new(MockInference::new()),
            history: Arc::new(history),
            identity: Arc::new(MockIdentity::anonymous()),
            recognizer: Box::new(recognizer),
        },
        TurnSettings::default(),
        tx,
    );

    assert!(!chat.speech_supported());
    assert!(chat.toggle_dictation().is_err());
    assert_eq!(chat.dictation_state(), DictationState::Stopped);
    assert_eq!(mic.starts(), 0);
}

#[tokio::test]
async fn test_new_content_signal_fires_per_append() {
    let mut h = harness();
    let mut revisions = h.chat.conversation().subscribe();
    h.inference.queue_reply("pong");

    h.type_text("ping");
    h.chat.submit_turn();
    assert_eq!(*revisions.borrow_and_update(), 1);

    h.pump().await;
    assert!(revisions.has_changed().unwrap());
    assert_eq!(*revisions.borrow_and_update(), 2);
}

#[tokio::test]
async fn test_events_after_close_are_harmless() {
    let mut h = harness();
    h.inference.queue_reply("late");
    h.type_text("hello");
    h.chat.submit_turn();

    let event = h.events.recv().await.unwrap();
    assert!(matches!(event, ChatEvent::Reply(_)));
    drop(h.events);
    h.chat.handle_event(event);
    assert_eq!(h.chat.conversation().len(), 2);
}

#[tokio::test]
async fn test_recognizer_ending_releases_input() {
    let mut h = harness();
    h.chat.start_dictation().unwrap();
    h.mic.emit(SpeechUpdate::Final("heap sort".to_string()));
    h.pump().await;

    assert!(h.mic.emit(SpeechUpdate::Ended));
    h.pump().await;
    assert_eq!(h.chat.dictation_state(), DictationState::Stopped);
    assert_eq!(h.chat.input().text(), "heap sort");

    h.chat.edit_input().unwrap().insert_char('?');
    assert_eq!(h.chat.input().text(), "heap sort?");
}

#[cfg(unix)]
#[tokio::test]
async fn test_dictation_program_exit_stops_listening() {
    use dsagpt_core::CommandRecognizer;

    let (tx, mut events) = events::channel();
    let (history, _saved) = MockHistory::new();
    let mut chat = TurnOrchestrator::new(
        ChatServices {
            inference: Arc::new(MockInference::new()),
            history: Arc::new(history),
            identity: Arc::new(MockIdentity::anonymous()),
            recognizer: Box::new(CommandRecognizer::new(
                "sh",
                vec!["-c".to_string(), "echo hello".to_string()],
            )),
        },
        TurnSettings::default(),
        tx,
    );

    chat.start_dictation().unwrap();
    while chat.dictation_state() == DictationState::Listening {
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("dictation program never reported the end of its output")
            .expect("event channel closed");
        chat.handle_event(event);
    }

    assert_eq!(chat.input().text(), "hello");
    let input = chat.edit_input().expect("input should be editable once the program exits");
    input.move_end();
    input.insert_char('!');
    assert_eq!(chat.input().text(), "hello!");
}
