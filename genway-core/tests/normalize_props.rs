//! Property tests for JSON output normalization

use genway_core::providers::normalize::{normalize_json, strip_code_fence};
use proptest::prelude::*;
use serde_json::{Map, Value};

fn json_object() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-z_]{1,8}", any::<i64>(), 0..6).prop_map(|fields| {
        Value::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k, Value::from(v)))
                .collect::<Map<String, Value>>(),
        )
    })
}

proptest! {
    #[test]
    fn fenced_object_round_trips(
        value in json_object(),
        tag in prop_oneof![Just(""), Just("json"), Just("JSON")],
        before in "[A-Za-z ,.:]{0,30}",
        after in "[A-Za-z ,.!]{0,30}",
        pretty in any::<bool>(),
    ) {
        let body = if pretty {
            serde_json::to_string_pretty(&value).unwrap()
        } else {
            serde_json::to_string(&value).unwrap()
        };
        let text = format!("{}\n```{}\n{}\n```\n{}", before, tag, body, after);

        prop_assert_eq!(normalize_json(&text, "prop").unwrap(), value);
    }

    #[test]
    fn unfenced_json_is_parsed_as_is(value in json_object(), padding in "[ \n\t]{0,4}") {
        let text = format!("{}{}{}", padding, value, padding);
        prop_assert_eq!(normalize_json(&text, "prop").unwrap(), value);
    }

    #[test]
    fn strip_code_fence_never_panics(text in ".{0,200}") {
        let stripped = strip_code_fence(&text);
        prop_assert!(stripped.len() <= text.len());
    }
}
