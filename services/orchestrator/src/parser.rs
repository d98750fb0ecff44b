//! Decision parsing
//!
//! Models wrap their JSON in code fences, preambles and sign-offs;
//! extraction finds the first balanced object and everything after the
//! brace scan is strict: a missing or mistyped field fails the whole
//! round with `invalid_response`, and no orders are submitted.

use thiserror::Error;
use types::decision::AgentDecision;
use types::order::OrderAction;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("reply contains no JSON object")]
    NoJson,

    #[error("reply is not valid JSON: {message}")]
    Json { message: String },

    #[error("decision failed schema validation: {message}")]
    Schema { message: String },
}

/// Parse and validate one model reply.
pub fn parse_decision(raw: &str) -> Result<AgentDecision, ParseError> {
    let json = extract_json(raw).ok_or(ParseError::NoJson)?;
    let decision: AgentDecision = serde_json::from_str(json).map_err(|e| ParseError::Json {
        message: e.to_string(),
    })?;
    validate(&decision)?;
    Ok(decision)
}

/// Open orders must carry side, quantity and leverage on the wire;
/// closes derive theirs from the referenced position.
fn validate(decision: &AgentDecision) -> Result<(), ParseError> {
    for (idx, order) in decision.orders.iter().enumerate() {
        match order.action {
            OrderAction::Open => {
                for (field, present) in [
                    ("side", order.side.is_some()),
                    ("quantity", order.quantity.is_some()),
                    ("leverage", order.leverage.is_some()),
                ] {
                    if !present {
                        return Err(ParseError::Schema {
                            message: format!("order {idx}: open order is missing {field}"),
                        });
                    }
                }
            }
            OrderAction::Close => {}
        }
    }
    Ok(())
}

/// Slice out the first balanced top-level JSON object, respecting
/// strings and escapes.
fn extract_json(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let bytes = raw.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match byte {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use types::decision::DecisionKind;
    use types::position::Side;

    #[test]
    fn test_plain_json() {
        let decision = parse_decision(
            r#"{ "decision": "trade", "reasoning": "r", "orders": [
                { "action": "open", "symbol": "BTCUSDT", "side": "buy",
                  "quantity": 0.01, "leverage": 2 }
            ] }"#,
        )
        .unwrap();

        assert_eq!(decision.decision, DecisionKind::Trade);
        assert_eq!(decision.orders[0].side, Some(Side::Long));
        assert_eq!(
            decision.orders[0].quantity,
            Some(Decimal::from_str_exact("0.01").unwrap())
        );
    }

    #[test]
    fn test_code_fenced_json() {
        let raw = "Here's my call:\n```json\n{ \"decision\": \"hold\", \"reasoning\": \"waiting\", \"orders\": [] }\n```\nGood luck!";
        let decision = parse_decision(raw).unwrap();
        assert_eq!(decision.decision, DecisionKind::Hold);
        assert!(decision.orders.is_empty());
    }

    #[test]
    fn test_braces_inside_strings() {
        let raw = r#"{ "decision": "hold", "reasoning": "support at {50k} looks \"strong\"", "orders": [] }"#;
        let decision = parse_decision(raw).unwrap();
        assert!(decision.reasoning.contains("{50k}"));
    }

    #[test]
    fn test_no_json_at_all() {
        assert_eq!(parse_decision("I think we should wait."), Err(ParseError::NoJson));
    }

    #[test]
    fn test_truncated_json() {
        let raw = r#"{ "decision": "trade", "orders": ["#;
        assert_eq!(parse_decision(raw), Err(ParseError::NoJson));
    }

    #[test]
    fn test_malformed_json() {
        let raw = r#"{ "decision": trade }"#;
        assert!(matches!(
            parse_decision(raw),
            Err(ParseError::Json { .. })
        ));
    }

    #[test]
    fn test_unknown_decision_kind() {
        let raw = r#"{ "decision": "yolo", "orders": [] }"#;
        assert!(matches!(parse_decision(raw), Err(ParseError::Json { .. })));
    }

    #[test]
    fn test_open_missing_leverage_fails_schema() {
        let raw = r#"{ "decision": "trade", "orders": [
            { "action": "open", "symbol": "BTCUSDT", "side": "buy", "quantity": 0.01 }
        ] }"#;
        let err = parse_decision(raw).unwrap_err();
        assert!(matches!(err, ParseError::Schema { .. }));
        assert!(err.to_string().contains("leverage"));
    }

    #[test]
    fn test_close_without_side_quantity_is_fine() {
        let raw = r#"{ "decision": "trade", "orders": [
            { "action": "close", "symbol": "ETHUSDT",
              "position_id": "0193338f-37a1-7e32-a4ac-93f468361f51" }
        ] }"#;
        let decision = parse_decision(raw).unwrap();
        assert_eq!(decision.orders[0].action, OrderAction::Close);
    }

    #[test]
    fn test_wrong_quantity_type_fails() {
        let raw = r#"{ "decision": "trade", "orders": [
            { "action": "open", "symbol": "BTCUSDT", "side": "buy",
              "quantity": {"a": 1}, "leverage": 2 }
        ] }"#;
        assert!(matches!(parse_decision(raw), Err(ParseError::Json { .. })));
    }

    #[test]
    fn test_quantity_as_string_is_accepted() {
        let raw = r#"{ "decision": "trade", "orders": [
            { "action": "open", "symbol": "BTCUSDT", "side": "sell",
              "quantity": "0.25", "leverage": "3" }
        ] }"#;
        let decision = parse_decision(raw).unwrap();
        assert_eq!(
            decision.orders[0].quantity,
            Some(Decimal::from_str_exact("0.25").unwrap())
        );
    }
}
