//! Two-stage content firewall.
//!
//! - [`ContentFirewall::guard_prompt`] runs on raw user input before generation and
//!   only checks the destructive-keyword set.
//! - [`ContentFirewall::guard_statement`] runs on generated statements before they are
//!   handed to an executor: keywords, then injection heuristics, then the
//!   multiple-statement check, short-circuiting on the first failure.
//!
//! Neither stage mutates its input. Classification is pattern based, not a parser.

mod patterns;

use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub use patterns::{InjectionSet, KeywordSet, DESTRUCTIVE_KEYWORDS};

/// Maximum number of characters of offending input written to the log.
const LOG_PREFIX_CHARS: usize = 50;

const STATEMENT_TERMINATOR: char = ';';

/// Destructive intent found in user input. This is a client error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Security Alert: Restricted keyword detected ({term}). This system is Read-Only.")]
pub struct PolicyRejection {
    pub term: String,
}

/// Why a generated statement must not be executed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatementRejection {
    #[error("restricted keyword: {0}")]
    RestrictedKeyword(String),

    #[error("possible injection detected")]
    InjectionDetected,

    #[error("multiple statements are not permitted")]
    MultipleStatements,
}

/// Outcome of a guard stage: either allowed with nothing else set, or blocked with
/// exactly one reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardResult {
    allowed: bool,
    blocked_term: Option<String>,
    reason: Option<String>,
}

impl GuardResult {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            blocked_term: None,
            reason: None,
        }
    }

    pub fn blocked(blocked_term: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            blocked_term,
            reason: Some(reason.into()),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    pub fn blocked_term(&self) -> Option<&str> {
        self.blocked_term.as_deref()
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

impl From<&PolicyRejection> for GuardResult {
    fn from(rejection: &PolicyRejection) -> Self {
        GuardResult::blocked(Some(rejection.term.clone()), rejection.to_string())
    }
}

/// Result of the pre-execution guard: the cleaned statement, or an empty statement
/// plus the reason it was rejected. Callers must not execute anything when
/// [`SanitizedStatement::rejection`] is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedStatement {
    statement: String,
    rejection: Option<StatementRejection>,
}

impl SanitizedStatement {
    fn accepted(statement: String) -> Self {
        Self {
            statement,
            rejection: None,
        }
    }

    fn rejected(rejection: StatementRejection) -> Self {
        Self {
            statement: String::new(),
            rejection: Some(rejection),
        }
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub fn rejection(&self) -> Option<&StatementRejection> {
        self.rejection.as_ref()
    }

    /// Rejection reason as a display string, if any.
    pub fn reason(&self) -> Option<String> {
        self.rejection.as_ref().map(ToString::to_string)
    }

    pub fn is_allowed(&self) -> bool {
        self.rejection.is_none()
    }

    /// `(sanitized_statement, block_reason)` pair handed to an executor.
    pub fn into_parts(self) -> (String, Option<String>) {
        let reason = self.reason();
        (self.statement, reason)
    }

    pub fn into_result(self) -> Result<String, StatementRejection> {
        match self.rejection {
            Some(rejection) => Err(rejection),
            None => Ok(self.statement),
        }
    }
}

/// Stateless classifier shared by every request.
///
/// Cloning is cheap: all pattern sets are reference counted and immutable.
#[derive(Debug, Clone)]
pub struct ContentFirewall {
    prompt_keywords: KeywordSet,
    statement_keywords: KeywordSet,
    injection: InjectionSet,
}

impl Default for ContentFirewall {
    fn default() -> Self {
        Self {
            prompt_keywords: KeywordSet::destructive(),
            statement_keywords: KeywordSet::destructive(),
            injection: InjectionSet::standard(),
        }
    }
}

impl ContentFirewall {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ContentFirewallBuilder {
        ContentFirewallBuilder::default()
    }

    /// Pre-generation guard over raw user input.
    pub fn guard_prompt(&self, text: &str) -> GuardResult {
        match self.check_prompt(text) {
            Ok(()) => GuardResult::allowed(),
            Err(rejection) => GuardResult::from(&rejection),
        }
    }

    /// Same check as [`guard_prompt`](Self::guard_prompt), shaped for `?`.
    pub fn check_prompt(&self, text: &str) -> Result<(), PolicyRejection> {
        match self.prompt_keywords.first_match(text) {
            Some(term) => {
                log::warn!(
                    "SECURITY ALERT: Blocked restricted keyword '{}' in user prompt. Content prefix: {}...",
                    term,
                    LogPrefix(text)
                );
                Err(PolicyRejection { term })
            }
            None => Ok(()),
        }
    }

    /// Pre-execution guard over a generated statement.
    pub fn guard_statement(&self, statement: &str) -> SanitizedStatement {
        if let Some(term) = self.statement_keywords.first_match(statement) {
            log::warn!("SQL FILTER: Blocked keyword '{}' in statement", term);
            return SanitizedStatement::rejected(StatementRejection::RestrictedKeyword(term));
        }

        if let Some(heuristic) = self.injection.first_match(statement) {
            log::warn!("SQL FILTER: Potential injection detected ({})", heuristic);
            return SanitizedStatement::rejected(StatementRejection::InjectionDetected);
        }

        let trimmed = statement.trim();
        let body = trimmed
            .strip_suffix(STATEMENT_TERMINATOR)
            .unwrap_or(trimmed);

        // Only one trailing terminator is allowed. Terminators inside literals and
        // comments still count.
        if body.contains(STATEMENT_TERMINATOR) {
            log::warn!("SQL FILTER: Multiple statements detected");
            return SanitizedStatement::rejected(StatementRejection::MultipleStatements);
        }

        SanitizedStatement::accepted(body.trim().to_string())
    }
}

/// Builder for a firewall whose stages are tuned independently.
#[derive(Debug, Default)]
pub struct ContentFirewallBuilder {
    prompt_keywords: Option<KeywordSet>,
    statement_keywords: Option<KeywordSet>,
    injection: Option<InjectionSet>,
}

impl ContentFirewallBuilder {
    pub fn prompt_keywords(mut self, keywords: KeywordSet) -> Self {
        self.prompt_keywords = Some(keywords);
        self
    }

    pub fn statement_keywords(mut self, keywords: KeywordSet) -> Self {
        self.statement_keywords = Some(keywords);
        self
    }

    pub fn injection(mut self, injection: InjectionSet) -> Self {
        self.injection = Some(injection);
        self
    }

    pub fn build(self) -> ContentFirewall {
        ContentFirewall {
            prompt_keywords: self.prompt_keywords.unwrap_or_else(KeywordSet::destructive),
            statement_keywords: self
                .statement_keywords
                .unwrap_or_else(KeywordSet::destructive),
            injection: self.injection.unwrap_or_else(InjectionSet::standard),
        }
    }
}

/// Bounded, escaped view of user text for log lines.
struct LogPrefix<'a>(&'a str);

impl fmt::Display for LogPrefix<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars().take(LOG_PREFIX_CHARS) {
            write!(f, "{}", c.escape_debug())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn firewall() -> ContentFirewall {
        ContentFirewall::default()
    }

    #[test]
    fn safe_prompts_pass() {
        let fw = firewall();
        assert!(fw.guard_prompt("SELECT * FROM users").is_allowed());
        assert!(fw.guard_prompt("show me all customers").is_allowed());
        assert!(fw.guard_prompt("What is the total revenue?").is_allowed());
    }

    #[test]
    fn destructive_prompt_reports_uppercased_term() {
        let result = firewall().guard_prompt("please drop the users table");
        assert!(!result.is_allowed());
        assert_eq!(result.blocked_term(), Some("DROP"));
        assert_eq!(
            result.reason(),
            Some("Security Alert: Restricted keyword detected (DROP). This system is Read-Only.")
        );
    }

    #[test]
    fn every_destructive_keyword_is_blocked_in_any_case() {
        let fw = firewall();
        for keyword in DESTRUCTIVE_KEYWORDS {
            for variant in [keyword.to_string(), keyword.to_lowercase()] {
                let err = fw
                    .check_prompt(&format!("please {variant} something"))
                    .unwrap_err();
                assert_eq!(err.term, *keyword);
            }
        }
        assert_eq!(fw.check_prompt("DrOp TaBlE users").unwrap_err().term, "DROP");
    }

    #[test]
    fn guard_result_is_never_partially_populated() {
        let allowed = GuardResult::allowed();
        assert!(allowed.is_allowed());
        assert!(allowed.reason().is_none());
        assert!(allowed.blocked_term().is_none());

        let blocked = firewall().guard_prompt("TRUNCATE TABLE users");
        assert!(!blocked.is_allowed());
        assert!(blocked.reason().is_some());
    }

    #[test]
    fn prompt_guard_ignores_injection_shapes() {
        // Only keywords matter before anything has been generated.
        assert!(firewall()
            .guard_prompt("what does UNION ALL SELECT do?")
            .is_allowed());
    }

    #[test]
    fn safe_select_passes_unchanged() {
        let query = "SELECT * FROM employees WHERE department = 'IT'";
        let (sanitized, reason) = firewall().guard_statement(query).into_parts();
        assert_eq!(sanitized, query);
        assert_eq!(reason, None);
    }

    #[test]
    fn trailing_terminator_is_stripped_idempotently() {
        let fw = firewall();
        let first = fw.guard_statement("SELECT * FROM users;");
        assert_eq!(first.statement(), "SELECT * FROM users");
        assert!(first.is_allowed());

        let second = fw.guard_statement(first.statement());
        assert_eq!(second, first);
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let result = firewall().guard_statement("  SELECT 1 FROM dual ;  \n");
        assert_eq!(result.statement(), "SELECT 1 FROM dual");
    }

    #[test]
    fn keyword_check_runs_before_injection_check() {
        let result = firewall().guard_statement("SELECT * FROM users; -- DROP TABLE users");
        assert_eq!(
            result.rejection(),
            Some(&StatementRejection::RestrictedKeyword("DROP".to_string()))
        );
        assert_eq!(result.statement(), "");
        assert_eq!(result.reason().as_deref(), Some("restricted keyword: DROP"));
    }

    #[test]
    fn injection_without_keyword_is_rejected() {
        let result =
            firewall().guard_statement("SELECT * FROM users UNION ALL SELECT * FROM passwords");
        assert_eq!(result.rejection(), Some(&StatementRejection::InjectionDetected));
        assert_eq!(result.reason().as_deref(), Some("possible injection detected"));
    }

    #[test]
    fn comment_after_separator_is_injection() {
        let result = firewall().guard_statement("SELECT name FROM users; --");
        assert_eq!(result.rejection(), Some(&StatementRejection::InjectionDetected));
    }

    #[test]
    fn multiple_statements_are_rejected() {
        let fw = firewall();
        for query in [
            "SELECT 1; SELECT 2",
            "SELECT * FROM users; SELECT * FROM passwords",
            "SELECT 1;;",
        ] {
            let result = fw.guard_statement(query);
            assert_eq!(
                result.rejection(),
                Some(&StatementRejection::MultipleStatements),
                "{query}"
            );
        }
    }

    #[test]
    fn terminators_inside_literals_still_count() {
        let result = firewall().guard_statement("SELECT ';' AS a, ';' AS b FROM dual");
        assert_eq!(result.rejection(), Some(&StatementRejection::MultipleStatements));
    }

    #[test]
    fn inner_terminator_before_the_end_is_rejected() {
        let fw = firewall();
        assert_eq!(
            fw.guard_statement("SELECT ';' FROM dual").rejection(),
            Some(&StatementRejection::MultipleStatements)
        );
        assert_eq!(
            fw.guard_statement("  SELECT 1; SELECT 2;  ").rejection(),
            Some(&StatementRejection::MultipleStatements)
        );
    }

    #[test]
    fn only_one_trailing_terminator_is_removed() {
        let result = firewall().guard_statement("SELECT 1 ;");
        assert!(result.is_allowed());
        assert_eq!(result.statement(), "SELECT 1");
    }

    #[test]
    fn stages_can_be_tuned_independently() {
        let fw = ContentFirewall::builder()
            .prompt_keywords(KeywordSet::empty())
            .statement_keywords(KeywordSet::new(["DROP", "INSERT"]).unwrap())
            .build();

        assert!(fw.guard_prompt("drop everything").is_allowed());
        assert_eq!(
            fw.guard_statement("INSERT INTO t VALUES (1)").into_result(),
            Err(StatementRejection::RestrictedKeyword("INSERT".to_string()))
        );
    }

    #[test]
    fn log_prefix_is_bounded_and_escaped() {
        let text = format!("drop\nfake log line {}", "x".repeat(200));
        let rendered = LogPrefix(&text).to_string();
        assert!(!rendered.contains('\n'));
        assert!(rendered.starts_with("drop\\nfake"));
        assert!(rendered.len() < 60);
    }
}
