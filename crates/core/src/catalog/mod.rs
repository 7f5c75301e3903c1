//! The trigger registry and the generator built on top of it. Adding a
//! trigger means adding one `TriggerDefinition` entry plus its renderer.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::domain::setup::{GenerationRequest, GenerationResult};
use crate::payload;

mod pine;

#[derive(Debug, Clone, Copy)]
pub enum ParamKind {
    /// Whole-number tunable, clamped into [min, max].
    Int { min: i64, max: i64, default: i64 },
    /// One of a fixed option set, matched case-insensitively.
    Choice {
        options: &'static [&'static str],
        default: &'static str,
    },
    /// Intraday window in exchange time, "HHMM-HHMM".
    Session { default: &'static str },
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: ParamKind,
}

impl ParamSpec {
    // Invalid input never fails generation: unparsable values fall back to
    // the declared default, out-of-range integers clamp to the nearest bound.
    fn resolve(&self, raw: Option<&Value>) -> ParamValue {
        match self.kind {
            ParamKind::Int { min, max, default } => {
                let parsed = raw.and_then(int_value);
                ParamValue::Int(parsed.map_or(default, |v| v.clamp(min, max)))
            }
            ParamKind::Choice { options, default } => {
                let chosen = raw
                    .and_then(Value::as_str)
                    .and_then(|s| options.iter().find(|o| o.eq_ignore_ascii_case(s.trim())))
                    .copied()
                    .unwrap_or(default);
                ParamValue::Text(chosen.to_string())
            }
            ParamKind::Session { default } => {
                let window = raw
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| is_valid_session(s))
                    .unwrap_or(default);
                ParamValue::Text(window.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Int(i64),
    Text(String),
}

/// Every declared parameter of a trigger, resolved to a concrete value.
#[derive(Debug, Clone, Default)]
pub struct ResolvedParams(BTreeMap<&'static str, ParamValue>);

impl ResolvedParams {
    pub fn int(&self, name: &str) -> i64 {
        match self.0.get(name) {
            Some(ParamValue::Int(v)) => *v,
            _ => panic!("integer param {name} not declared for this trigger"),
        }
    }

    pub fn text(&self, name: &str) -> &str {
        match self.0.get(name) {
            Some(ParamValue::Text(v)) => v,
            _ => panic!("text param {name} not declared for this trigger"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TriggerDefinition {
    pub id: &'static str,
    pub display_name: &'static str,
    pub explanation: &'static str,
    pub params: &'static [ParamSpec],
    render: fn(&ResolvedParams) -> String,
}

impl TriggerDefinition {
    pub fn resolve_params(&self, raw: &BTreeMap<String, Value>) -> ResolvedParams {
        let mut out = BTreeMap::new();
        for spec in self.params {
            out.insert(spec.name, spec.resolve(raw.get(spec.name)));
        }
        ResolvedParams(out)
    }
}

const BREAKOUT_PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "lookback",
        label: "Lookback bars",
        kind: ParamKind::Int {
            min: 1,
            max: 500,
            default: 20,
        },
    },
    ParamSpec {
        name: "basis",
        label: "Level basis",
        kind: ParamKind::Choice {
            options: &["High", "Close"],
            default: "High",
        },
    },
];

const BREAKDOWN_PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "lookback",
        label: "Lookback bars",
        kind: ParamKind::Int {
            min: 1,
            max: 500,
            default: 20,
        },
    },
    ParamSpec {
        name: "basis",
        label: "Level basis",
        kind: ParamKind::Choice {
            options: &["Low", "Close"],
            default: "Low",
        },
    },
];

const OPENING_RANGE_PARAMS: &[ParamSpec] = &[ParamSpec {
    name: "session",
    label: "Opening window",
    kind: ParamKind::Session {
        default: "0930-1000",
    },
}];

static CATALOG: &[TriggerDefinition] = &[
    TriggerDefinition {
        id: "breakout",
        display_name: "Breakout",
        explanation: "Closes above the prior 20-bar high (classic, excludes current bar); clean momentum breakout.",
        params: BREAKOUT_PARAMS,
        render: pine::breakout,
    },
    TriggerDefinition {
        id: "breakdown",
        display_name: "Breakdown",
        explanation: "Closes below the prior 20-bar low (excludes current bar); momentum failure to the downside.",
        params: BREAKDOWN_PARAMS,
        render: pine::breakdown,
    },
    TriggerDefinition {
        id: "ma10",
        display_name: "MA10 Breakdown",
        explanation: "Crosses below the 10-period SMA to flag short-term momentum weakness.",
        params: &[],
        render: pine::ma10_breakdown,
    },
    TriggerDefinition {
        id: "ma50",
        display_name: "MA50 Breakdown",
        explanation: "Crosses below the 50-period SMA to flag higher-timeframe weakness.",
        params: &[],
        render: pine::ma50_breakdown,
    },
    TriggerDefinition {
        id: "range_breakout",
        display_name: "Range Breakout",
        explanation: "3 red then 1 green; once armed, fires intrabar on a break above the green candle's high (one-shot).",
        params: &[],
        render: pine::bullish_reversal,
    },
    TriggerDefinition {
        id: "bearish_reversal",
        display_name: "Bearish Reversal",
        explanation: "3 green then 1 red; once armed, fires intrabar on a break below the red candle's low (one-shot).",
        params: &[],
        render: pine::bearish_reversal,
    },
    TriggerDefinition {
        id: "orh",
        display_name: "Opening Range High",
        explanation: "Locks in the opening-range high once the window closes; fires once per session on a break above it.",
        params: OPENING_RANGE_PARAMS,
        render: pine::opening_range_high,
    },
    TriggerDefinition {
        id: "orl",
        display_name: "Opening Range Low",
        explanation: "Locks in the opening-range low once the window closes; fires once per session on a break below it.",
        params: OPENING_RANGE_PARAMS,
        render: pine::opening_range_low,
    },
];

pub fn catalog() -> &'static [TriggerDefinition] {
    CATALOG
}

pub fn find(id: &str) -> Option<&'static TriggerDefinition> {
    CATALOG.iter().find(|def| def.id == id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    UnknownTrigger(String),
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerateError::UnknownTrigger(id) => write!(f, "unknown trigger id: {id}"),
        }
    }
}

impl std::error::Error for GenerateError {}

/// Build the script and the payload preview for one request. Pure; identical
/// input yields byte-identical output.
pub fn generate(request: &GenerationRequest) -> Result<GenerationResult, GenerateError> {
    let def = find(&request.trigger)
        .ok_or_else(|| GenerateError::UnknownTrigger(request.trigger.clone()))?;

    let params = def.resolve_params(&request.params);
    let body = (def.render)(&params);

    // The alert message always carries the symbol token; the platform fills
    // in the chart symbol when the alert fires.
    let alert_message =
        payload::render_compact(&payload::fields(def.id, payload::SYMBOL_TOKEN.to_string()));

    let script = format!(
        "//@version=5\n\
         indicator(\"Trade Watch: {id} Trigger\", overlay=true)\n\
         {body}\n\
         \n\
         plotshape(trigger, location=location.belowbar, style=shape.labelup, color=color.green, text=\"\u{1F6A8}\")\n\
         alertcondition(trigger, title=\"{id} Trigger\", message='{alert_message}')\n",
        id = def.id,
    );

    let symbol = resolve_symbol(request.ticker.as_deref());
    let payload_text = payload::render_pretty(&payload::fields(def.id, symbol));

    Ok(GenerationResult {
        script,
        payload: payload_text,
    })
}

fn resolve_symbol(ticker: Option<&str>) -> String {
    match ticker.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => t.to_ascii_uppercase(),
        None => payload::SYMBOL_TOKEN.to_string(),
    }
}

fn int_value(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    if let Some(f) = value.as_f64() {
        return Some(f as i64);
    }
    value.as_str().and_then(|s| s.trim().parse().ok())
}

fn is_valid_session(s: &str) -> bool {
    let Some((start, end)) = s.split_once('-') else {
        return false;
    };
    valid_hhmm(start) && valid_hhmm(end)
}

fn valid_hhmm(s: &str) -> bool {
    if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let hour: u32 = s[..2].parse().unwrap_or(99);
    let minute: u32 = s[2..].parse().unwrap_or(99);
    hour < 24 && minute < 60
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(trigger: &str, ticker: Option<&str>) -> GenerationRequest {
        GenerationRequest {
            trigger: trigger.to_string(),
            ticker: ticker.map(str::to_string),
            params: BTreeMap::new(),
        }
    }

    #[test]
    fn every_catalog_entry_generates_deterministically() {
        for def in catalog() {
            let req = request(def.id, Some("aapl"));
            let first = generate(&req).unwrap();
            let second = generate(&req).unwrap();
            assert_eq!(first, second, "trigger {} is not deterministic", def.id);
        }
    }

    #[test]
    fn unknown_trigger_is_rejected() {
        let err = generate(&request("hhhl", None)).unwrap_err();
        assert_eq!(err, GenerateError::UnknownTrigger("hhhl".to_string()));
    }

    #[test]
    fn breakout_payload_has_expected_fields() {
        let result = generate(&request("breakout", Some("AAPL"))).unwrap();
        assert!(result.payload.contains("\"symbol\": \"AAPL\""));
        assert!(result.payload.contains("\"setup\": \"breakout\""));
        assert!(result.payload.contains("\"price\": {{close}}"));
        assert!(result.payload.contains("\"volume\": {{volume}}"));
        assert!(result.payload.contains("\"timestamp\": \"{{time}}\""));
        assert!(!result.payload.contains("\"{{close}}\""));
        assert!(!result.payload.contains("\"{{volume}}\""));
    }

    #[test]
    fn ticker_is_uppercased_and_idempotent() {
        let lower = generate(&request("breakout", Some("aapl"))).unwrap();
        let upper = generate(&request("breakout", Some("AAPL"))).unwrap();
        assert_eq!(lower.payload, upper.payload);
    }

    #[test]
    fn empty_ticker_uses_placeholder_token() {
        for ticker in [None, Some(""), Some("   ")] {
            let result = generate(&request("breakout", ticker)).unwrap();
            assert!(result.payload.contains("\"symbol\": \"{{ticker}}\""));
            assert!(!result.payload.contains("\"symbol\": \"\""));
            assert!(!result.payload.contains("undefined"));
        }
    }

    #[test]
    fn script_has_header_marker_and_one_alert() {
        for def in catalog() {
            let result = generate(&request(def.id, Some("SPY"))).unwrap();
            assert!(result.script.starts_with("//@version=5\n"));
            assert!(result
                .script
                .contains(&format!("indicator(\"Trade Watch: {} Trigger\"", def.id)));
            assert!(result.script.contains("plotshape(trigger"));
            assert_eq!(
                result.script.matches("alertcondition(").count(),
                1,
                "trigger {} must register exactly one alert",
                def.id
            );
        }
    }

    #[test]
    fn alert_message_and_preview_stay_in_lockstep() {
        for def in catalog() {
            let result = generate(&request(def.id, Some("TSLA"))).unwrap();
            let compact = payload::render_compact(&payload::fields(
                def.id,
                payload::SYMBOL_TOKEN.to_string(),
            ));
            assert!(
                result.script.contains(&format!("message='{compact}'")),
                "trigger {} alert message drifted from the payload fields",
                def.id
            );
        }
    }

    #[test]
    fn lookback_clamps_and_defaults() {
        let mut req = request("breakout", None);

        req.params.insert("lookback".to_string(), json!(50));
        let result = generate(&req).unwrap();
        assert!(result.script.contains("ta.highest(high[1], 50)"));

        req.params.insert("lookback".to_string(), json!("abc"));
        let result = generate(&req).unwrap();
        assert!(result.script.contains("ta.highest(high[1], 20)"));

        req.params.insert("lookback".to_string(), json!(0));
        let result = generate(&req).unwrap();
        assert!(result.script.contains("ta.highest(high[1], 1)"));

        req.params.insert("lookback".to_string(), json!(10_000));
        let result = generate(&req).unwrap();
        assert!(result.script.contains("ta.highest(high[1], 500)"));
    }

    #[test]
    fn basis_matches_case_insensitively_and_defaults() {
        let mut req = request("breakout", None);

        req.params.insert("basis".to_string(), json!("close"));
        let result = generate(&req).unwrap();
        assert!(result.script.contains("ta.highest(close[1], 20)"));

        req.params.insert("basis".to_string(), json!("volume"));
        let result = generate(&req).unwrap();
        assert!(result.script.contains("ta.highest(high[1], 20)"));
    }

    #[test]
    fn session_window_validates_or_defaults() {
        let mut req = request("orh", None);

        req.params.insert("session".to_string(), json!("0930-1030"));
        let result = generate(&req).unwrap();
        assert!(result.script.contains("time(timeframe.period, \"0930-1030\")"));

        req.params.insert("session".to_string(), json!("25:99"));
        let result = generate(&req).unwrap();
        assert!(result.script.contains("time(timeframe.period, \"0930-1000\")"));

        req.params.insert("session".to_string(), json!("2500-1000"));
        let result = generate(&req).unwrap();
        assert!(result.script.contains("time(timeframe.period, \"0930-1000\")"));
    }

    #[test]
    fn breakdown_mirrors_breakout() {
        let result = generate(&request("breakdown", None)).unwrap();
        assert!(result.script.contains("ta.lowest(low[1], 20)"));
        assert!(result.script.contains("ta.crossunder(close, priorLow)"));
    }
}
