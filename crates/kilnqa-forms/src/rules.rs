//! Domain field rules.
//!
//! A [`FieldRule`] pairs a [`NamePattern`] with a numeric range check. The
//! standard [`RuleSet`] has three categories:
//!
//! | Category | Matches | Invalid when |
//! |---|---|---|
//! | quantity | name contains `quantity` | value < 0 |
//! | kiln temperature | name is exactly `kiln_temperature` | value < 800 or > 1400 |
//! | percentage | name contains `percentage` or `efficiency` | value < 0 or > 100 |
//!
//! Every check only fires on a value that coerces to a number (see
//! [`parse_decimal`]). Empty or non-numeric text is `Valid` here and left to
//! the host's own required/type constraints.

use std::fmt;

use regex::Regex;

use kilnqa_core::ValidationSettings;

/// Outcome of checking one raw field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidityResult {
    /// The value satisfies the rule.
    Valid,
    /// The value violates the rule; carries the message shown to the user.
    Invalid(String),
}

impl ValidityResult {
    /// Returns `true` for [`ValidityResult::Valid`].
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// The custom validity message for the host: empty when valid.
    pub fn message(&self) -> &str {
        match self {
            Self::Valid => "",
            Self::Invalid(message) => message,
        }
    }
}

/// Predicate over field names.
#[derive(Debug, Clone)]
pub enum NamePattern {
    /// The whole name equals the string.
    Exact(String),
    /// The name contains the string.
    Contains(String),
    /// Any of the inner patterns matches.
    AnyOf(Vec<NamePattern>),
    /// The regex matches somewhere in the name.
    Matches(Regex),
}

impl NamePattern {
    /// Shorthand for [`NamePattern::Exact`].
    pub fn exact(name: impl Into<String>) -> Self {
        Self::Exact(name.into())
    }

    /// Shorthand for [`NamePattern::Contains`].
    pub fn contains(fragment: impl Into<String>) -> Self {
        Self::Contains(fragment.into())
    }

    /// Returns `true` if `name` satisfies the pattern.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(exact) => name == exact,
            Self::Contains(fragment) => name.contains(fragment.as_str()),
            Self::AnyOf(patterns) => patterns.iter().any(|p| p.matches(name)),
            Self::Matches(regex) => regex.is_match(name),
        }
    }
}

/// The field category a rule belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleCategory {
    /// Produced or consumed quantities.
    Quantity,
    /// The firing temperature of a kiln.
    KilnTemperature,
    /// Percentages and efficiency ratings.
    Percentage,
    /// Application-defined category.
    Custom(String),
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quantity => f.write_str("quantity"),
            Self::KilnTemperature => f.write_str("kiln_temperature"),
            Self::Percentage => f.write_str("percentage"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

/// A stateless range rule for fields whose name matches a pattern.
#[derive(Debug, Clone)]
pub struct FieldRule {
    category: RuleCategory,
    pattern: NamePattern,
    min: Option<f64>,
    max: Option<f64>,
    message: String,
}

impl FieldRule {
    /// Creates a rule rejecting numeric values outside `[min, max]`.
    ///
    /// Either bound may be open.
    pub fn range(
        category: RuleCategory,
        pattern: NamePattern,
        min: Option<f64>,
        max: Option<f64>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            pattern,
            min,
            max,
            message: message.into(),
        }
    }

    /// The rule's category.
    pub const fn category(&self) -> &RuleCategory {
        &self.category
    }

    /// The message reported for violations.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if this rule applies to the named field.
    pub fn applies_to(&self, name: &str) -> bool {
        self.pattern.matches(name)
    }

    /// Checks one raw field value.
    pub fn check(&self, raw: &str) -> ValidityResult {
        let Some(value) = parse_decimal(raw) else {
            return ValidityResult::Valid;
        };
        let below = self.min.is_some_and(|min| value < min);
        let above = self.max.is_some_and(|max| value > max);
        if below || above {
            ValidityResult::Invalid(self.message.clone())
        } else {
            ValidityResult::Valid
        }
    }
}

/// An ordered, fixed collection of rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<FieldRule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard(&ValidationSettings::default())
    }
}

impl RuleSet {
    /// Creates a rule set from explicit rules, in priority order.
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    /// The quantity, kiln temperature and percentage rules.
    pub fn standard(bounds: &ValidationSettings) -> Self {
        let quantity_message = if bounds.quantity_min.abs() < f64::EPSILON {
            "quantity cannot be negative".to_string()
        } else {
            format!("quantity cannot be less than {}", bounds.quantity_min)
        };

        Self::new(vec![
            FieldRule::range(
                RuleCategory::Quantity,
                NamePattern::contains("quantity"),
                Some(bounds.quantity_min),
                None,
                quantity_message,
            ),
            FieldRule::range(
                RuleCategory::KilnTemperature,
                NamePattern::exact("kiln_temperature"),
                Some(bounds.kiln_min_celsius),
                Some(bounds.kiln_max_celsius),
                format!(
                    "temperature must be between {}°C and {}°C",
                    bounds.kiln_min_celsius, bounds.kiln_max_celsius
                ),
            ),
            FieldRule::range(
                RuleCategory::Percentage,
                NamePattern::AnyOf(vec![
                    NamePattern::contains("percentage"),
                    NamePattern::contains("efficiency"),
                ]),
                Some(bounds.percentage_min),
                Some(bounds.percentage_max),
                format!(
                    "percentage must be between {} and {}",
                    bounds.percentage_min, bounds.percentage_max
                ),
            ),
        ])
    }

    /// Appends a rule with the lowest priority.
    #[must_use]
    pub fn with_rule(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Returns the first rule, in declaration order, matching `name`.
    ///
    /// A field is governed by at most one rule.
    pub fn rule_for(&self, name: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|rule| rule.applies_to(name))
    }

    /// All rules in priority order.
    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }
}

/// Coerces field text to a number the way page scripts do.
///
/// Leading whitespace is skipped and the longest leading decimal literal is
/// used (`"12kg"` is 12, `"-3.5e2x"` is -350). `Infinity` with an optional
/// sign is accepted. Returns `None` when the text has no numeric prefix.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();

    let mut end = 0;
    let negative = bytes.first() == Some(&b'-');
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    if s[end..].starts_with("Infinity") {
        return Some(if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits + frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    s[..end].parse::<f64>().ok()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(name: &str, raw: &str) -> ValidityResult {
        RuleSet::default()
            .rule_for(name)
            .map_or(ValidityResult::Valid, |rule| rule.check(raw))
    }

    // ── Decimal coercion ────────────────────────────────────────────

    #[test]
    fn test_parse_decimal_plain() {
        assert_eq!(parse_decimal("42"), Some(42.0));
        assert_eq!(parse_decimal("-0.5"), Some(-0.5));
        assert_eq!(parse_decimal("+7"), Some(7.0));
        assert_eq!(parse_decimal(".25"), Some(0.25));
        assert_eq!(parse_decimal("5."), Some(5.0));
    }

    #[test]
    fn test_parse_decimal_prefix() {
        assert_eq!(parse_decimal("  12kg"), Some(12.0));
        assert_eq!(parse_decimal("-3.5e2x"), Some(-350.0));
        assert_eq!(parse_decimal("1e"), Some(1.0));
        assert_eq!(parse_decimal("2e+"), Some(2.0));
        assert_eq!(parse_decimal("1.2.3"), Some(1.2));
    }

    #[test]
    fn test_parse_decimal_none() {
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("   "), None);
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("-"), None);
        assert_eq!(parse_decimal("."), None);
        assert_eq!(parse_decimal("NaN"), None);
        assert_eq!(parse_decimal("kg12"), None);
    }

    #[test]
    fn test_parse_decimal_infinity() {
        assert_eq!(parse_decimal("Infinity"), Some(f64::INFINITY));
        assert_eq!(parse_decimal("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_decimal("infinity"), None);
    }

    // ── Quantity ────────────────────────────────────────────────────

    #[test]
    fn test_quantity_negative_is_invalid() {
        assert_eq!(
            check("planned_quantity", "-1"),
            ValidityResult::Invalid("quantity cannot be negative".into())
        );
        assert_eq!(
            check("quantity_kg", "-0.001"),
            ValidityResult::Invalid("quantity cannot be negative".into())
        );
    }

    #[test]
    fn test_quantity_non_negative_is_valid() {
        assert!(check("actual_quantity", "0").is_valid());
        assert!(check("actual_quantity", "980").is_valid());
        assert!(check("actual_quantity", "-0").is_valid());
    }

    #[test]
    fn test_quantity_non_numeric_is_valid() {
        assert!(check("planned_quantity", "").is_valid());
        assert!(check("planned_quantity", "lots").is_valid());
    }

    // ── Kiln temperature ────────────────────────────────────────────

    #[test]
    fn test_kiln_temperature_bounds() {
        let message = "temperature must be between 800°C and 1400°C";
        assert_eq!(
            check("kiln_temperature", "799.9"),
            ValidityResult::Invalid(message.into())
        );
        assert!(check("kiln_temperature", "800").is_valid());
        assert!(check("kiln_temperature", "1180").is_valid());
        assert!(check("kiln_temperature", "1400").is_valid());
        assert_eq!(
            check("kiln_temperature", "1400.01"),
            ValidityResult::Invalid(message.into())
        );
    }

    #[test]
    fn test_kiln_temperature_optional() {
        assert!(check("kiln_temperature", "").is_valid());
        assert!(check("kiln_temperature", "hot").is_valid());
    }

    #[test]
    fn test_kiln_temperature_requires_exact_name() {
        assert!(RuleSet::default().rule_for("kiln_temperature_max").is_none());
        assert!(RuleSet::default().rule_for("firing_temperature").is_none());
    }

    // ── Percentage / efficiency ─────────────────────────────────────

    #[test]
    fn test_percentage_bounds() {
        let message = "percentage must be between 0 and 100";
        assert_eq!(
            check("recycling_percentage", "100.0001"),
            ValidityResult::Invalid(message.into())
        );
        assert_eq!(
            check("recycling_percentage", "-1"),
            ValidityResult::Invalid(message.into())
        );
        assert!(check("recycling_percentage", "100").is_valid());
        assert!(check("recycling_percentage", "0").is_valid());
    }

    #[test]
    fn test_efficiency_uses_percentage_rule() {
        let rule = RuleSet::default().rule_for("efficiency_rating").cloned().unwrap();
        assert_eq!(rule.category(), &RuleCategory::Percentage);
        assert!(!rule.check("101").is_valid());
        assert!(rule.check("87.5").is_valid());
    }

    // ── Rule set ────────────────────────────────────────────────────

    #[test]
    fn test_unmatched_fields_have_no_rule() {
        let rules = RuleSet::default();
        assert!(rules.rule_for("lot_number").is_none());
        assert!(rules.rule_for("notes").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let rule = RuleSet::default().rule_for("quantity_percentage").cloned().unwrap();
        assert_eq!(rule.category(), &RuleCategory::Quantity);
    }

    #[test]
    fn test_custom_bounds_change_message() {
        let bounds = ValidationSettings {
            kiln_min_celsius: 900.0,
            kiln_max_celsius: 1250.5,
            ..ValidationSettings::default()
        };
        let rules = RuleSet::standard(&bounds);
        let rule = rules.rule_for("kiln_temperature").unwrap();
        assert_eq!(rule.message(), "temperature must be between 900°C and 1250.5°C");
        assert!(!rule.check("850").is_valid());
    }

    #[test]
    fn test_regex_pattern_custom_rule() {
        let rules = RuleSet::default().with_rule(FieldRule::range(
            RuleCategory::Custom("dimension".into()),
            NamePattern::Matches(Regex::new(r"^(length|width|thickness)$").unwrap()),
            Some(0.0),
            None,
            "dimension must be positive",
        ));
        let rule = rules.rule_for("thickness").unwrap();
        assert_eq!(rule.category(), &RuleCategory::Custom("dimension".into()));
        assert_eq!(rule.check("-2").message(), "dimension must be positive");
        assert!(rules.rule_for("warping").is_none());
    }

    #[test]
    fn test_validity_message() {
        assert_eq!(ValidityResult::Valid.message(), "");
        assert_eq!(ValidityResult::Invalid("bad".into()).message(), "bad");
    }
}
