//! AMQP topic pattern matching.
//!
//! Used by the in-memory bus to reproduce broker-side binding semantics:
//! `*` matches exactly one dot-separated word, `#` matches zero or more.

/// Returns true if `routing_key` matches the binding `pattern`.
pub fn topic_matches(pattern: &str, routing_key: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let key: Vec<&str> = routing_key.split('.').collect();
    match_words(&pattern, &key)
}

fn match_words(pattern: &[&str], key: &[&str]) -> bool {
    match pattern.split_first() {
        None => key.is_empty(),
        Some((&"#", rest)) => (0..=key.len()).any(|skip| match_words(rest, &key[skip..])),
        Some((word, rest)) => match key.split_first() {
            Some((head, tail)) => (*word == "*" || word == head) && match_words(rest, tail),
            None => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_key_matches_itself() {
        assert!(topic_matches("event.orderplaced", "event.orderplaced"));
        assert!(!topic_matches("event.orderplaced", "event.ordercancelled"));
    }

    #[test]
    fn star_matches_exactly_one_word() {
        assert!(topic_matches("event.*", "event.orderplaced"));
        assert!(topic_matches("event.*", "event.paymentfailed"));
        assert!(!topic_matches("event.*", "event"));
        assert!(!topic_matches("event.*", "event.order.placed"));
    }

    #[test]
    fn hash_matches_zero_or_more_words() {
        assert!(topic_matches("#", "event.orderplaced"));
        assert!(topic_matches("event.#", "event.orderplaced"));
        assert!(topic_matches("event.#", "event"));
        assert!(topic_matches("event.#", "event.order.placed"));
        assert!(!topic_matches("orders.#", "event.orderplaced"));
    }

    #[test]
    fn star_in_the_middle() {
        assert!(topic_matches("event.*.failed", "event.payment.failed"));
        assert!(!topic_matches("event.*.failed", "event.failed"));
    }
}
