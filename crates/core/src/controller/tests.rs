use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use tokio::time::timeout;
use vugasu_chat_model::{ChatMessage, ErrorKind};
use vugasu_chat_test_model::{PresetFailure, TestChatProvider};

use crate::conversation::{MessageKind, Sender};
use crate::store::{
    ConversationStore, MemoryBackend, STORAGE_KEY, StorageBackend,
};
use crate::{
    ControllerBuilder, ControllerStage, ConversationController,
    DEFAULT_GREETING, SubmitOutcome,
};

const SYSTEM_PROMPT: &str = "You are the Vugasu Kennels assistant.";

fn build(
    provider: &TestChatProvider,
    backend: &MemoryBackend,
) -> ConversationController {
    ControllerBuilder::with_chat_provider(provider.clone())
        .with_store(ConversationStore::new(backend.clone()))
        .with_system_prompt(SYSTEM_PROMPT)
        .build()
}

fn stored_len(backend: &MemoryBackend) -> usize {
    ConversationStore::new(backend.clone()).load().len()
}

#[test]
fn test_seeds_greeting() {
    let backend = MemoryBackend::default();
    let controller = build(&TestChatProvider::default(), &backend);

    let messages = controller.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].sender(), Sender::Assistant);
    assert_eq!(messages[0].content(), DEFAULT_GREETING);
    assert_eq!(controller.stage(), ControllerStage::Idle);
    assert_eq!(controller.error(), None);
    assert_eq!(stored_len(&backend), 1);
}

#[test]
fn test_custom_greeting() {
    let controller =
        ControllerBuilder::with_chat_provider(TestChatProvider::default())
            .with_greeting("Woof! Ask me anything.")
            .build();
    assert_eq!(controller.messages()[0].content(), "Woof! Ask me anything.");
}

#[test]
fn test_restores_stored_history() {
    let backend = MemoryBackend::default();
    backend
        .set(
            STORAGE_KEY,
            r#"[{"id":"1","content":"Hi","sender":"bot","timestamp":"2024-01-01T00:00:00.000Z"}]"#,
        )
        .unwrap();
    let controller = build(&TestChatProvider::default(), &backend);

    let messages = controller.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id(), "1");
    assert_eq!(messages[0].content(), "Hi");
    assert_eq!(messages[0].sender(), Sender::Assistant);
    assert_eq!(
        messages[0].timestamp(),
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    );
}

#[test]
fn test_bad_timestamps_fall_back_to_greeting() {
    let backend = MemoryBackend::default();
    backend
        .set(
            STORAGE_KEY,
            r#"[{"id":"1","content":"Hi","sender":"bot","timestamp":"someday"}]"#,
        )
        .unwrap();
    let controller = build(&TestChatProvider::default(), &backend);

    let messages = controller.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content(), DEFAULT_GREETING);
}

#[tokio::test]
async fn test_submit_success() {
    let provider = TestChatProvider::default();
    provider.add_reply("We have three puppies available.");
    let backend = MemoryBackend::default();
    let controller = build(&provider, &backend);

    let outcome = controller.submit("  Tell me about puppies ").await;
    let SubmitOutcome::Replied(reply) = outcome else {
        panic!("unexpected outcome: {outcome:?}");
    };
    assert_eq!(reply.content(), "We have three puppies available.");

    let messages = controller.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].sender(), Sender::User);
    assert_eq!(messages[1].content(), "Tell me about puppies");
    assert_eq!(messages[1].kind(), Some(MessageKind::Text));
    assert_eq!(messages[2], reply);
    assert_ne!(messages[1].id(), messages[2].id());
    assert!(messages[1].timestamp() <= messages[2].timestamp());

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].messages,
        vec![
            ChatMessage::System(SYSTEM_PROMPT.to_owned()),
            ChatMessage::Assistant(DEFAULT_GREETING.to_owned()),
            ChatMessage::User("Tell me about puppies".to_owned()),
        ]
    );

    assert_eq!(stored_len(&backend), 3);
    assert_eq!(controller.stage(), ControllerStage::Idle);
    assert_eq!(controller.error(), None);
}

#[tokio::test]
async fn test_transcript_carries_history() {
    let provider = TestChatProvider::default();
    provider.add_reply("First answer.");
    provider.add_reply("Second answer.");
    let controller = build(&provider, &MemoryBackend::default());

    controller.submit("First question").await;
    controller.submit("Second question").await;

    let requests = provider.requests();
    let roles: Vec<_> = requests[1].messages.iter().map(|m| m.role()).collect();
    let contents: Vec<_> =
        requests[1].messages.iter().map(|m| m.content()).collect();
    assert_eq!(
        roles.iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        ["system", "assistant", "user", "assistant", "user"]
    );
    assert_eq!(contents[3], "First answer.");
    assert_eq!(contents[4], "Second question");
}

#[tokio::test]
async fn test_submit_failure_keeps_user_turn() {
    let provider = TestChatProvider::default();
    provider.add_failure(PresetFailure::Network);
    provider.add_reply("Sorry about that, how can I help?");
    let backend = MemoryBackend::default();

    let reported = Arc::new(Mutex::new(Vec::new()));
    let controller = ControllerBuilder::with_chat_provider(provider.clone())
        .with_store(ConversationStore::new(backend.clone()))
        .on_error({
            let reported = Arc::clone(&reported);
            move |err| reported.lock().unwrap().push(err.kind())
        })
        .build();

    let outcome = controller.submit("hi").await;
    let SubmitOutcome::Failed(message) = outcome else {
        panic!("unexpected outcome: {outcome:?}");
    };
    assert!(message.contains("try again"));
    assert!(message.contains("contact us directly"));
    assert_eq!(controller.error(), Some(message));
    assert_eq!(*reported.lock().unwrap(), [ErrorKind::Transport]);

    let messages = controller.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].sender(), Sender::User);
    assert_eq!(messages[1].content(), "hi");
    assert_eq!(stored_len(&backend), 2);
    assert_eq!(controller.stage(), ControllerStage::Idle);

    // The next submission goes through and clears the error.
    let outcome = controller.submit("hello again").await;
    assert!(matches!(outcome, SubmitOutcome::Replied(_)));
    assert_eq!(controller.error(), None);
    assert_eq!(controller.messages().len(), 4);
}

#[tokio::test]
async fn test_failure_kinds_share_one_message() {
    let provider = TestChatProvider::default();
    provider.add_failure(PresetFailure::RateLimited);
    provider.add_failure(PresetFailure::Malformed);
    provider.add_failure(PresetFailure::Status);
    let controller = build(&provider, &MemoryBackend::default());

    let mut errors = Vec::new();
    for text in ["one", "two", "three"] {
        let SubmitOutcome::Failed(message) = controller.submit(text).await
        else {
            panic!("expected a failure");
        };
        errors.push(message);
    }
    assert!(errors.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn test_blank_submissions_are_ignored() {
    let provider = TestChatProvider::default();
    let backend = MemoryBackend::default();
    let controller = build(&provider, &backend);

    for text in ["", "   ", "\n\t"] {
        assert_eq!(controller.submit(text).await, SubmitOutcome::Ignored);
    }
    assert_eq!(controller.messages().len(), 1);
    assert_eq!(provider.request_count(), 0);
    assert_eq!(stored_len(&backend), 1);
}

#[tokio::test(start_paused = true)]
async fn test_single_flight() {
    let provider = TestChatProvider::default();
    provider.set_delay(Duration::from_secs(3));
    provider.add_reply("First reply.");
    provider.add_reply("Never requested.");
    let controller = build(&provider, &MemoryBackend::default());

    let (first, second) = tokio::join!(controller.submit("first"), async {
        assert!(controller.is_typing());
        controller.submit("second").await
    });

    assert!(matches!(first, SubmitOutcome::Replied(_)));
    assert_eq!(second, SubmitOutcome::Ignored);
    assert_eq!(provider.request_count(), 1);

    let contents: Vec<_> = controller
        .messages()
        .iter()
        .map(|m| m.content().to_owned())
        .collect();
    assert_eq!(contents[1..], ["first", "First reply."]);
    assert!(!controller.is_typing());
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_reply_returns_to_idle() {
    let provider = TestChatProvider::default();
    provider.set_delay(Duration::from_secs(10));
    provider.add_reply("Too late.");
    provider.add_reply("Right on time.");
    let backend = MemoryBackend::default();
    let controller = build(&provider, &backend);

    let result =
        timeout(Duration::from_secs(1), controller.submit("anyone?")).await;
    assert!(result.is_err());
    assert_eq!(controller.stage(), ControllerStage::Idle);
    assert_eq!(controller.messages().len(), 2);
    assert_eq!(stored_len(&backend), 2);

    let outcome = controller.submit("hello?").await;
    let SubmitOutcome::Replied(reply) = outcome else {
        panic!("unexpected outcome: {outcome:?}");
    };
    assert_eq!(reply.content(), "Right on time.");
}

#[tokio::test(start_paused = true)]
async fn test_initialize_keeps_pending_flight() {
    let provider = TestChatProvider::default();
    provider.set_delay(Duration::from_secs(3));
    provider.add_reply("A");
    provider.add_reply("B");
    provider.add_reply("C");
    let controller = build(&provider, &MemoryBackend::default());

    let (first, second, third) = tokio::join!(
        controller.submit("first"),
        async {
            controller.initialize();
            assert!(controller.is_typing());
            controller.submit("second").await
        },
        async {
            tokio::time::sleep(Duration::from_millis(3500)).await;
            controller.submit("third").await
        },
    );

    let SubmitOutcome::Replied(first) = first else {
        panic!("unexpected outcome: {first:?}");
    };
    assert_eq!(first.content(), "A");
    assert_eq!(second, SubmitOutcome::Ignored);
    let SubmitOutcome::Replied(third) = third else {
        panic!("unexpected outcome: {third:?}");
    };
    assert_eq!(third.content(), "B");
    assert_eq!(provider.request_count(), 2);
    assert!(!controller.is_typing());

    let contents: Vec<_> = controller
        .messages()
        .iter()
        .map(|m| m.content().to_owned())
        .collect();
    assert_eq!(contents[1..], ["first", "A", "third", "B"]);
}

#[tokio::test]
async fn test_clear_history() {
    let provider = TestChatProvider::default();
    provider.add_reply("Sure.");
    provider.add_failure(PresetFailure::Status);
    let backend = MemoryBackend::default();
    let controller = build(&provider, &backend);

    controller.submit("one").await;
    controller.submit("two").await;
    assert_eq!(controller.messages().len(), 4);
    assert!(controller.error().is_some());

    controller.clear_history();
    let messages = controller.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].sender(), Sender::Assistant);
    assert_eq!(messages[0].content(), DEFAULT_GREETING);
    assert_eq!(controller.error(), None);

    let stored = ConversationStore::new(backend.clone()).load();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, messages[0].id());
    assert_eq!(stored[0].content, DEFAULT_GREETING);
}

#[tokio::test(start_paused = true)]
async fn test_clear_while_awaiting_drops_reply() {
    let provider = TestChatProvider::default();
    provider.set_delay(Duration::from_secs(3));
    provider.add_reply("Stale reply.");
    let backend = MemoryBackend::default();
    let controller = build(&provider, &backend);

    let (outcome, ()) = tokio::join!(controller.submit("question"), async {
        controller.clear_history();
    });

    assert_eq!(outcome, SubmitOutcome::Discarded);
    let messages = controller.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content(), DEFAULT_GREETING);
    assert_eq!(stored_len(&backend), 1);
    assert_eq!(controller.stage(), ControllerStage::Idle);
}

#[tokio::test]
async fn test_quick_reply() {
    let provider = TestChatProvider::default();
    provider.add_reply("Our puppies come from West German lines.");
    provider.add_reply("Anytime!");
    let controller = build(&provider, &MemoryBackend::default());

    let prompt = "Tell me about your available puppies and their bloodlines.";
    controller.select_quick_reply(prompt);
    assert_eq!(controller.draft(), prompt);
    assert_eq!(controller.messages().len(), 1);
    assert_eq!(provider.request_count(), 0);

    controller.submit(&controller.draft()).await;
    assert_eq!(controller.draft(), "");
    let messages = controller.messages();
    assert_eq!(messages[1].content(), prompt);
    assert_eq!(messages[1].kind(), Some(MessageKind::QuickReply));

    controller.select_quick_reply(prompt);
    controller.set_draft("Thanks!");
    controller.submit(&controller.draft()).await;
    assert_eq!(controller.messages()[3].kind(), Some(MessageKind::Text));
}

#[tokio::test]
async fn test_export_and_share() {
    let provider = TestChatProvider::default();
    provider.add_reply("Yes, two litters this spring.");
    let controller = build(&provider, &MemoryBackend::default());
    controller.submit("Any litters planned?").await;

    let exported = controller.export_history_in(&Utc);
    let entries: Vec<_> = exported.split("\n\n").collect();
    assert_eq!(entries.len(), 3);
    assert!(entries[0].starts_with(&format!("Assistant: {DEFAULT_GREETING}\n")));
    assert!(entries[1].starts_with("You: Any litters planned?\n"));
    assert!(entries[2].starts_with("Assistant: Yes, two litters this spring.\n"));

    assert_eq!(
        controller.share_text(),
        format!(
            "Assistant: {DEFAULT_GREETING}\n\n\
             You: Any litters planned?\n\n\
             Assistant: Yes, two litters this spring."
        )
    );
    // Exporting is read-only.
    assert_eq!(controller.messages().len(), 3);
}

#[tokio::test]
async fn test_history_survives_restart() {
    let provider = TestChatProvider::default();
    provider.add_reply("Noted.");
    let backend = MemoryBackend::default();

    let before = {
        let controller = build(&provider, &backend);
        controller.submit("Remember me").await;
        controller.messages()
    };
    let controller = build(&provider, &backend);
    assert_eq!(controller.messages(), before);
}
