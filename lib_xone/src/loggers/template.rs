//! # Message-Template Logging
//!
//! Log calls pass positional values; the level's template names them.
//! `'{runKey} {step} {status}'` rendered with `("Pricing", "ParseInputs",
//! Ok)` produces both the flat message and the named field pairs, keeping
//! log records searchable by field in the shipping backend.
//!
//! Templates live in a process-wide registry and can be replaced with
//! [`register_template`].

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use serde_json::Value;
use static_init::dynamic;

/// Default template for `info` records.
pub const DEFAULT_TEMPLATE_MESSAGE_INFO: &str = "{runKey} {step} {status}";
/// Default template for `error` records.
pub const DEFAULT_TEMPLATE_MESSAGE_ERROR: &str =
    "{runKey} {step} {status} {exceptionType} {exceptionMessage}";
/// Default template for `warning` records.
pub const DEFAULT_TEMPLATE_MESSAGE_WARNING: &str = "{runKey} {step} {detailedOrigin} {status}";
/// Default template for `debug` records.
pub const DEFAULT_TEMPLATE_MESSAGE_DEBUG: &str = "{runKey} {step} {debugMessage}";

/// Step outcome vocabulary used in log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStatus {
    /// The step has begun.
    Started,
    /// The step finished cleanly.
    Ok,
    /// The step failed.
    Error,
    /// The step finished but reported errors along the way.
    RanWithError,
    /// The step raised a non-fatal concern.
    Warning,
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LogStatus::Started => "Started",
            LogStatus::Ok => "Ok",
            LogStatus::Error => "Error",
            LogStatus::RanWithError => "RanWithError",
            LogStatus::Warning => "Warning",
        };
        f.write_str(text)
    }
}

/// Template slots, one per wrapper level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateLevel {
    /// `info` records.
    Info,
    /// `error` records.
    Error,
    /// `warning` records.
    Warning,
    /// `debug` records.
    Debug,
}

fn default_templates() -> HashMap<TemplateLevel, String> {
    HashMap::from([
        (TemplateLevel::Info, DEFAULT_TEMPLATE_MESSAGE_INFO.to_string()),
        (TemplateLevel::Error, DEFAULT_TEMPLATE_MESSAGE_ERROR.to_string()),
        (
            TemplateLevel::Warning,
            DEFAULT_TEMPLATE_MESSAGE_WARNING.to_string(),
        ),
        (TemplateLevel::Debug, DEFAULT_TEMPLATE_MESSAGE_DEBUG.to_string()),
    ])
}

#[dynamic]
/// Process-wide template registry.
static TEMPLATES: RwLock<HashMap<TemplateLevel, String>> = RwLock::new(default_templates());

/// Replaces the template used for the given level, process-wide.
pub fn register_template(level: TemplateLevel, template: &str) {
    TEMPLATES
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .insert(level, template.to_string());
}

fn template_for(level: TemplateLevel) -> String {
    TEMPLATES
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .get(&level)
        .cloned()
        .unwrap_or_default()
}

/// A rendered log message: flat text, the template it came from (when the
/// template had placeholders), and the named field pairs in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    /// Flat message text.
    pub text: String,
    /// The message template, when placeholders were present.
    pub template: Option<String>,
    /// `(placeholder, value)` pairs in template order.
    pub fields: Vec<(String, String)>,
}

/// Renders a template by pairing its `{name}` placeholders with the
/// positional arguments in order. Unmatched placeholders stay in place;
/// surplus arguments are dropped. A template without placeholders is
/// returned unchanged.
pub fn render_template(template: &str, args: &[&str]) -> RenderedMessage {
    let mut text = String::with_capacity(template.len());
    let mut fields = Vec::new();
    let mut arg_index = 0;
    let mut saw_placeholder = false;
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        text.push_str(&rest[..open]);
        let Some(close_rel) = rest[open..].find('}') else {
            // Unterminated brace, keep the tail verbatim.
            text.push_str(&rest[open..]);
            rest = "";
            break;
        };
        let close = open + close_rel;
        let name = &rest[open + 1..close];
        saw_placeholder = true;
        match args.get(arg_index) {
            Some(value) => {
                text.push_str(value);
                fields.push((name.to_string(), (*value).to_string()));
                arg_index += 1;
            }
            None => text.push_str(&rest[open..=close]),
        }
        rest = &rest[close + 1..];
    }
    text.push_str(rest);

    RenderedMessage {
        text,
        template: saw_placeholder.then(|| template.to_string()),
        fields,
    }
}

/// # Logger Wrapper
///
/// Carries a run key and a per-wrapper record counter. Each call renders
/// the level's template, with the run key injected as the first argument,
/// and emits through `tracing` with the template, run key, record order
/// and field pairs attached.
pub struct LoggerWrapper {
    name: String,
    run_key: String,
    log_order: AtomicU64,
    extra: Option<Value>,
}

impl LoggerWrapper {
    /// Creates a wrapper with no static extra fields.
    pub fn new(name: impl Into<String>, run_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            run_key: run_key.into(),
            log_order: AtomicU64::new(0),
            extra: None,
        }
    }

    /// Attaches static extra fields carried on every record.
    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = Some(extra);
        self
    }

    /// The run key all records of this wrapper share.
    pub fn run_key(&self) -> &str {
        &self.run_key
    }

    fn render(&self, level: TemplateLevel, args: &[&str]) -> (u64, RenderedMessage) {
        let order = self.log_order.fetch_add(1, Ordering::SeqCst) + 1;
        let template = template_for(level);
        let mut full_args: Vec<&str> = Vec::with_capacity(args.len() + 1);
        full_args.push(self.run_key.as_str());
        full_args.extend_from_slice(args);
        (order, render_template(&template, &full_args))
    }

    fn fields_json(rendered: &RenderedMessage) -> String {
        serde_json::to_string(&rendered.fields).unwrap_or_default()
    }

    fn extra_json(&self) -> String {
        self.extra
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_default()
    }

    /// `{runKey} {step} {status}`
    pub fn info(&self, step: &str, status: LogStatus) {
        let status = status.to_string();
        let (order, rendered) = self.render(TemplateLevel::Info, &[step, &status]);
        tracing::info!(
            logger = %self.name,
            run_key = %self.run_key,
            log_order = order,
            message_template = rendered.template.as_deref(),
            fields = %Self::fields_json(&rendered),
            extra = %self.extra_json(),
            "{}",
            rendered.text
        );
    }

    /// `{runKey} {step} {status} {exceptionType} {exceptionMessage}`
    pub fn error(
        &self,
        step: &str,
        status: LogStatus,
        exception_type: &str,
        exception_message: &str,
    ) {
        let status = status.to_string();
        let (order, rendered) = self.render(
            TemplateLevel::Error,
            &[step, &status, exception_type, exception_message],
        );
        tracing::error!(
            logger = %self.name,
            run_key = %self.run_key,
            log_order = order,
            message_template = rendered.template.as_deref(),
            fields = %Self::fields_json(&rendered),
            extra = %self.extra_json(),
            "{}",
            rendered.text
        );
    }

    /// `{runKey} {step} {detailedOrigin} {status}`
    pub fn warn(&self, step: &str, detailed_origin: &str, status: LogStatus) {
        let status = status.to_string();
        let (order, rendered) =
            self.render(TemplateLevel::Warning, &[step, detailed_origin, &status]);
        tracing::warn!(
            logger = %self.name,
            run_key = %self.run_key,
            log_order = order,
            message_template = rendered.template.as_deref(),
            fields = %Self::fields_json(&rendered),
            extra = %self.extra_json(),
            "{}",
            rendered.text
        );
    }

    /// `{runKey} {step} {debugMessage}`
    pub fn debug(&self, step: &str, debug_message: &str) {
        let (order, rendered) = self.render(TemplateLevel::Debug, &[step, debug_message]);
        tracing::debug!(
            logger = %self.name,
            run_key = %self.run_key,
            log_order = order,
            message_template = rendered.template.as_deref(),
            fields = %Self::fields_json(&rendered),
            extra = %self.extra_json(),
            "{}",
            rendered.text
        );
    }
}

/// Convenience constructor mirroring the usual call site shape.
pub fn init_logger(name: &str, run_key: &str, extra: Option<Value>) -> LoggerWrapper {
    let wrapper = LoggerWrapper::new(name, run_key);
    match extra {
        Some(extra) => wrapper.with_extra(extra),
        None => wrapper,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_placeholders_in_order() {
        let rendered = render_template(
            DEFAULT_TEMPLATE_MESSAGE_INFO,
            &["SwapPricing", "ParseInputs", "Started"],
        );
        assert_eq!(rendered.text, "SwapPricing ParseInputs Started");
        assert_eq!(
            rendered.template.as_deref(),
            Some(DEFAULT_TEMPLATE_MESSAGE_INFO)
        );
        assert_eq!(
            rendered.fields,
            vec![
                ("runKey".to_string(), "SwapPricing".to_string()),
                ("step".to_string(), "ParseInputs".to_string()),
                ("status".to_string(), "Started".to_string()),
            ]
        );
    }

    #[test]
    fn unfilled_placeholders_stay_in_place() {
        let rendered = render_template("{runKey} {step}", &["only"]);
        assert_eq!(rendered.text, "only {step}");
        assert_eq!(rendered.fields.len(), 1);
    }

    #[test]
    fn template_without_placeholders_is_unchanged() {
        let rendered = render_template("plain message", &["ignored"]);
        assert_eq!(rendered.text, "plain message");
        assert!(rendered.template.is_none());
        assert!(rendered.fields.is_empty());
    }

    #[test]
    fn surplus_arguments_are_dropped() {
        let rendered = render_template("{a}", &["x", "y"]);
        assert_eq!(rendered.text, "x");
        assert_eq!(rendered.fields, vec![("a".to_string(), "x".to_string())]);
    }

    #[test]
    fn registered_template_replaces_the_default() {
        register_template(TemplateLevel::Debug, "{runKey}|{details}");
        let rendered = render_template(&super::template_for(TemplateLevel::Debug), &["rk", "d"]);
        assert_eq!(rendered.text, "rk|d");
        register_template(TemplateLevel::Debug, DEFAULT_TEMPLATE_MESSAGE_DEBUG);
    }

    #[test]
    fn log_status_display_matches_the_vocabulary() {
        assert_eq!(LogStatus::RanWithError.to_string(), "RanWithError");
        assert_eq!(LogStatus::Ok.to_string(), "Ok");
    }

    #[test]
    fn wrapper_emits_without_panicking() {
        let logger = init_logger(
            "fit_xone",
            "SwapPricing",
            Some(serde_json::json!({"route": "/api/swap_pricer/VanillaSwap"})),
        );
        logger.info("ParseInputs", LogStatus::Started);
        logger.warn("ParseInputs", "validator", LogStatus::Warning);
        logger.error(
            "ParseInputs",
            LogStatus::Error,
            "InvalidInputsException",
            "Failed to parse inputs",
        );
        logger.debug("ParseInputs", "raw payload accepted");
    }
}
