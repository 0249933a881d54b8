//! Property-based tests for subprotocol parsing and send ordering.

use proptest::prelude::*;
use rsws_session::headers::parse_subprotocols;
use rsws_session::transport::memory::MemoryBehavior;
use rsws_session::{Client, InlineExecutor, MemoryTransport};

fn token_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9._-]{1,12}"
}

fn padding_strategy() -> impl Strategy<Value = String> {
    "[ \t]{0,3}"
}

proptest! {
    // =========================================================================
    // Subprotocol parsing keeps every non-empty token, trimmed, in order
    // =========================================================================
    #[test]
    fn test_parse_subprotocols_keeps_tokens(
        tokens in prop::collection::vec((token_strategy(), padding_strategy(), padding_strategy()), 0..8),
        empties in prop::collection::vec(0usize..8, 0..4)
    ) {
        let mut parts: Vec<String> = tokens
            .iter()
            .map(|(token, left, right)| format!("{left}{token}{right}"))
            .collect();
        for position in empties {
            let at = position.min(parts.len());
            parts.insert(at, " ".to_string());
        }
        let joined = parts.join(",");

        let expected: Vec<String> = tokens.into_iter().map(|(token, _, _)| token).collect();
        prop_assert_eq!(parse_subprotocols(&joined), expected);
    }

    #[test]
    fn test_parse_subprotocols_never_yields_blank(input in ".{0,64}") {
        for token in parse_subprotocols(&input) {
            prop_assert!(!token.is_empty());
            prop_assert_eq!(token.trim(), token.as_str());
            prop_assert!(!token.contains(','));
        }
    }

    // =========================================================================
    // Any interleaving of enqueues and completions preserves FIFO delivery
    // =========================================================================
    #[test]
    fn test_fifo_under_interleaving(
        steps in prop::collection::vec(any::<bool>(), 1..64),
        fail_mask in prop::collection::vec(any::<bool>(), 64)
    ) {
        let transport = MemoryTransport::with_behavior(MemoryBehavior {
            manual_writes: true,
            ..MemoryBehavior::default()
        });
        let client = Client::new(transport.clone(), InlineExecutor);
        let session = client.create_session();
        prop_assert!(session.connect("ws://prop.local", "").unwrap().result().unwrap().is_ok());
        let conn = transport.last_connection().unwrap();

        let mut sent = Vec::new();
        let mut completions = 0;
        for enqueue in steps {
            if enqueue {
                let text = format!("m{}", sent.len());
                session.send_message(&text).unwrap();
                sent.push(text);
            } else {
                let result = if fail_mask[completions % fail_mask.len()] {
                    Err(rsws_session::TransportError::new(-1, "injected"))
                } else {
                    Ok(())
                };
                if conn.complete_next_write(result) {
                    completions += 1;
                }
            }
            prop_assert!(conn.pending_write_count() <= 1);
        }
        while conn.complete_next_write(Ok(())) {}

        prop_assert_eq!(conn.written_text(), sent);
        prop_assert!(conn.max_in_flight() <= 1);
    }
}
