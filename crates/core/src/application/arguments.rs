// Argument Extractor
//
// Merges query string, form body, JSON body and path-suffix pairs into one
// flat ArgumentMap. No validation against method signatures happens here.

use crate::domain::{ArgValue, ArgumentMap, Verb};
use bytes::Bytes;
use tracing::{debug, warn};

/// Routing key carrying the matched URL; never an argument
pub const RESERVED_ROUTING_KEY: &str = "url";

const JSON_MEDIA_TYPE: &str = "application/json";
const FORM_MEDIA_TYPE: &str = "application/x-www-form-urlencoded";

/// Member of a JSON body that, when present, holds the arguments
const PARAMS_MEMBER: &str = "params";

/// A request carrying a body is treated as POST whatever verb it declared
pub fn effective_verb(declared: Verb, body: &[u8]) -> Verb {
    if body.is_empty() {
        declared
    } else {
        Verb::Post
    }
}

/// Raw request pieces the extractor reads
#[derive(Debug, Clone, Copy)]
pub struct RequestParts<'a> {
    pub verb: Verb,
    pub query: &'a [(String, String)],
    pub body: &'a Bytes,
    pub content_type: Option<&'a str>,
    pub path_suffix: &'a str,
}

/// Build the argument map for one request
pub fn extract_arguments(parts: RequestParts<'_>) -> ArgumentMap {
    let verb = effective_verb(parts.verb, parts.body);
    let content_type = parts
        .content_type
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let mut args: ArgumentMap = if verb == Verb::Get {
        pairs_to_map(parts.query.iter().cloned())
    } else {
        form_arguments(&content_type, parts.body)
    };
    args.remove(RESERVED_ROUTING_KEY);

    if args.is_empty() && content_type.contains(JSON_MEDIA_TYPE) && !parts.body.is_empty() {
        args = json_arguments(parts.body);
    }

    for (key, value) in path_pairs(parts.path_suffix) {
        args.insert(key, ArgValue::Text(value));
    }

    debug!(count = args.len(), verb = %verb, "Extracted request arguments");
    args
}

fn pairs_to_map(pairs: impl Iterator<Item = (String, String)>) -> ArgumentMap {
    // Later duplicates win
    pairs.map(|(k, v)| (k, ArgValue::Text(v))).collect()
}

fn form_arguments(content_type: &str, body: &[u8]) -> ArgumentMap {
    if !content_type.contains(FORM_MEDIA_TYPE) || body.is_empty() {
        return ArgumentMap::new();
    }
    match serde_urlencoded::from_bytes::<Vec<(String, String)>>(body) {
        Ok(pairs) => pairs_to_map(pairs.into_iter()),
        Err(e) => {
            warn!(error = %e, "Ignoring undecodable form body");
            ArgumentMap::new()
        }
    }
}

fn json_arguments(body: &[u8]) -> ArgumentMap {
    let decoded: serde_json::Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Ignoring undecodable JSON body");
            return ArgumentMap::new();
        }
    };

    let serde_json::Value::Object(mut object) = decoded else {
        warn!("Ignoring JSON body that is not an object");
        return ArgumentMap::new();
    };

    let members = match object.remove(PARAMS_MEMBER) {
        Some(serde_json::Value::Object(params)) => params,
        Some(other) => {
            // `params` present but not an object: the body itself is the argument set
            object.insert(PARAMS_MEMBER.to_string(), other);
            object
        }
        None => object,
    };

    members
        .into_iter()
        .map(|(k, v)| (k, ArgValue::from(v)))
        .collect()
}

/// `/k1/v1/k2/v2` pairs, percent-decoded; dangling keys and empty values are skipped
fn path_pairs(suffix: &str) -> Vec<(String, String)> {
    let bits: Vec<&str> = suffix.trim_start_matches('/').split('/').collect();
    let mut pairs = Vec::with_capacity(bits.len() / 2);
    for pair in bits.chunks(2) {
        if let [key, value] = pair {
            if key.is_empty() || value.is_empty() {
                continue;
            }
            match (decode_segment(key), decode_segment(value)) {
                (Some(key), Some(value)) => pairs.push((key, value)),
                _ => warn!(key = %key, "Ignoring path pair that is not valid UTF-8 once decoded"),
            }
        }
    }
    pairs
}

fn decode_segment(segment: &str) -> Option<String> {
    urlencoding::decode(segment).ok().map(|s| s.into_owned())
}
