//! Property-based tests for the messaging core
//!
//! Uses proptest to generate random inputs and verify the invariants the
//! synchronizers rely on: wire round-trips, streak window consistency, and
//! the thread's uuid-uniqueness contract under arbitrary push sequences.

use std::sync::OnceLock;

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use uuid::Uuid;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ripple_chat::api::{ChatApiClient, GifClient};
use ripple_chat::shared::messaging::streak::{derive_streak, StreakData, StreakPhase};
use ripple_chat::shared::{ChatConfig, ChatMessage, Cursor, MessageContent, PostRef};
use ripple_chat::sync::MessageThreadSync;
use ripple_chat::transport::ChatTransport;

const CURRENT_USER: u128 = 1;
const FRIEND: u128 = 2;
const CONVERSATION: u128 = 10;

fn user(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

/// Shared runtime plus a mock backend that serves an empty first page for
/// any thread, reused across proptest cases.
struct TestEnv {
    rt: tokio::runtime::Runtime,
    uri: String,
}

fn env() -> &'static TestEnv {
    static ENV: OnceLock<TestEnv> = OnceLock::new();
    ENV.get_or_init(|| {
        let rt = tokio::runtime::Runtime::new().expect("runtime");
        let uri = rt.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path_regex(r"^/api/chat/conversations/.*/messages$"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "messages": [],
                    "nextCursor": null,
                    "hasNextPage": false,
                    "unreadCount": 0,
                    "isBlocked": false,
                })))
                .mount(&server)
                .await;
            let uri = server.uri();
            // Keep the server alive for the remaining cases.
            std::mem::forget(server);
            uri
        });
        TestEnv { rt, uri }
    })
}

fn content_strategy() -> impl Strategy<Value = MessageContent> {
    prop_oneof![
        "[a-z ]{0,40}".prop_map(|content| MessageContent::Text { content }),
        "[a-z]{1,12}".prop_map(|name| MessageContent::Image {
            content: format!("https://cdn.test/{}.jpg", name),
        }),
        "[a-z0-9]{1,12}".prop_map(|content| MessageContent::Gif { content }),
        (any::<bool>(), "[a-z]{1,8}").prop_map(|(has_image, id)| MessageContent::Post {
            post: Some(PostRef {
                id,
                image_url: has_image.then(|| "https://cdn.test/p.jpg".to_string()),
                caption: None,
            }),
        }),
        Just(MessageContent::Reel { post: None }),
    ]
}

/// A push in either direction between the open pair, or cross-talk between
/// two unrelated users.
#[derive(Debug, Clone)]
struct PushCase {
    uuid_slot: u8,
    minutes_ago: i64,
    from_friend: bool,
    cross_talk: bool,
}

fn push_strategy() -> impl Strategy<Value = PushCase> {
    (0u8..8, 0i64..10_000, any::<bool>(), any::<bool>()).prop_map(
        |(uuid_slot, minutes_ago, from_friend, cross_talk)| PushCase {
            uuid_slot,
            minutes_ago,
            from_friend,
            cross_talk,
        },
    )
}

fn build_push(case: &PushCase) -> ChatMessage {
    let (sender, receiver) = match (case.cross_talk, case.from_friend) {
        (true, _) => (user(77), user(78)),
        (false, true) => (user(FRIEND), user(CURRENT_USER)),
        (false, false) => (user(CURRENT_USER), user(FRIEND)),
    };
    ChatMessage {
        // A small uuid pool forces duplicate deliveries.
        uuid: user(1_000 + case.uuid_slot as u128),
        sender_id: sender,
        receiver_id: receiver,
        content: MessageContent::Text {
            content: format!("push-{}", case.uuid_slot),
        },
        created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
            - Duration::minutes(case.minutes_ago),
        is_read: false,
        reply_to: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_message_serde_roundtrip(
        content in content_strategy(),
        is_read in any::<bool>(),
        minutes in 0i64..100_000,
    ) {
        let message = ChatMessage {
            uuid: Uuid::from_u128(99),
            sender_id: user(CURRENT_USER),
            receiver_id: user(FRIEND),
            content,
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
                + Duration::minutes(minutes),
            is_read,
            reply_to: None,
        };
        let json = serde_json::to_string(&message).unwrap();
        let back: ChatMessage = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, message);
    }

    #[test]
    fn prop_cursor_roundtrip(token in "[a-zA-Z0-9]{0,16}") {
        let cursor = Cursor::from(token.clone());
        prop_assert_eq!(cursor.is_start(), token.is_empty());
        let json = serde_json::to_string(&cursor).unwrap();
        let back: Cursor = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, cursor);
    }

    #[test]
    fn prop_streak_windows_are_consistent(count in 0u32..500, minutes in 0i64..10_000) {
        let data = StreakData {
            current_count: count,
            last_streak_count: 0,
            last_interaction_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        };
        let now = data.last_interaction_at + Duration::minutes(minutes);
        let state = derive_streak(&data, now);

        // Danger only ever applies to an active streak, and recovery only
        // to an expired one.
        if state.is_danger {
            prop_assert!(state.is_active);
        }
        if state.can_recover {
            prop_assert!(!state.is_active);
        }

        let hours = minutes / 60;
        let expected_phase = if hours < 24 {
            if minutes > 18 * 60 { StreakPhase::AtRisk } else { StreakPhase::Active }
        } else if hours < 72 {
            StreakPhase::Recoverable
        } else {
            StreakPhase::Lapsed
        };
        prop_assert_eq!(state.phase(), expected_phase);

        // The counter survives exactly while the streak is alive.
        if state.is_active {
            prop_assert_eq!(state.current_count, count);
        } else {
            prop_assert_eq!(state.current_count, 0);
            prop_assert_eq!(state.last_streak_count, count);
        }
    }

    #[test]
    fn prop_thread_never_holds_duplicate_uuids(pushes in prop::collection::vec(push_strategy(), 1..40)) {
        let env = env();
        env.rt.block_on(async {
            let config = ChatConfig::builder()
                .api_url(env.uri.clone())
                .gif_api_url(env.uri.clone())
                .socket_url("ws://127.0.0.1:9")
                .token("test-token")
                .build()
                .unwrap();
            let mut thread = MessageThreadSync::new(
                std::sync::Arc::new(ChatApiClient::new(config.clone())),
                std::sync::Arc::new(GifClient::new(config.clone())),
                ChatTransport::new(config),
                user(CURRENT_USER),
            );
            thread
                .open(user(CONVERSATION), user(FRIEND))
                .await
                .expect("open");

            for case in &pushes {
                thread.apply_push(build_push(case));
            }

            // Uniqueness: no uuid appears twice regardless of delivery order.
            let mut seen = std::collections::HashSet::new();
            for message in thread.messages() {
                assert!(seen.insert(message.uuid), "duplicate uuid {}", message.uuid);
            }

            // Cross-talk never lands in the open thread.
            for message in thread.messages() {
                assert!(message.is_between(user(CURRENT_USER), user(FRIEND)));
            }

            // The rendered view stays sorted newest-first.
            for window in thread.messages().windows(2) {
                assert!(window[0].created_at >= window[1].created_at);
            }
        });
    }
}
