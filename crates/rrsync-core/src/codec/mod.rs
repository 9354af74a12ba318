//! Type-aware rdata canonicalization
//!
//! The lookup tool and the update tool disagree about how some record types
//! are written: character-string types come back quoted, TXT escapes its
//! semicolons, and digest types are split into whitespace-separated chunks.
//! The codec maps the text a query returns into a canonical form that can be
//! compared against configured data, and maps canonical data back into the
//! form an update expects.
//!
//! Rules per record type live in [`TYPE_RULES`]; supporting a new type is an
//! entry in that table.

use tracing::trace;

/// How a type's digest fields are regrouped when decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spacing {
    /// `tag alg digest-type chunk chunk` (DS, TLSA): the two trailing chunks are joined
    KeyTagged,
    /// `alg fp-type chunk chunk` (SSHFP): the two trailing chunks are joined
    Fingerprint,
}

impl Spacing {
    /// Number of leading numeric fields
    fn numeric_fields(self) -> usize {
        match self {
            Spacing::KeyTagged => 3,
            Spacing::Fingerprint => 2,
        }
    }
}

/// Formatting rules for one record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypeRules {
    /// Rdata is wrapped in double quotes on the wire
    pub quoted: bool,
    /// Rdata may contain `\;` that must be unescaped for comparison
    pub escaped: bool,
    /// Digest regrouping rule, if any
    pub spacing: Option<Spacing>,
}

impl TypeRules {
    const PLAIN: TypeRules = TypeRules {
        quoted: false,
        escaped: false,
        spacing: None,
    };
}

/// Record types that need more than plain text comparison
pub const TYPE_RULES: &[(&str, TypeRules)] = &[
    (
        "TXT",
        TypeRules {
            quoted: true,
            escaped: true,
            spacing: None,
        },
    ),
    (
        "SPF",
        TypeRules {
            quoted: true,
            escaped: false,
            spacing: None,
        },
    ),
    (
        "DS",
        TypeRules {
            quoted: false,
            escaped: false,
            spacing: Some(Spacing::KeyTagged),
        },
    ),
    (
        "TLSA",
        TypeRules {
            quoted: false,
            escaped: false,
            spacing: Some(Spacing::KeyTagged),
        },
    ),
    (
        "SSHFP",
        TypeRules {
            quoted: false,
            escaped: false,
            spacing: Some(Spacing::Fingerprint),
        },
    ),
];

/// Look up the rules for a type mnemonic (case-insensitive)
pub fn rules_for(record_type: &str) -> TypeRules {
    TYPE_RULES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(record_type))
        .map(|(_, rules)| *rules)
        .unwrap_or(TypeRules::PLAIN)
}

pub fn quoted(record_type: &str) -> bool {
    rules_for(record_type).quoted
}

pub fn escaped(record_type: &str) -> bool {
    rules_for(record_type).escaped
}

pub fn spaced(record_type: &str) -> bool {
    rules_for(record_type).spacing.is_some()
}

/// Decode rdata as reported by a query into canonical form
///
/// Unquote, unescape and unspace are applied in that order.
pub fn decode(record_type: &str, raw: &str) -> String {
    let rules = rules_for(record_type);

    let mut value = if rules.quoted {
        unquote(raw).to_string()
    } else {
        raw.to_string()
    };

    if rules.escaped {
        value = value.replace("\\;", ";");
    }

    if let Some(spacing) = rules.spacing {
        value = unspace(spacing, &value);
    }

    value
}

/// Encode canonical rdata for an update line
pub fn encode(record_type: &str, canonical: &str) -> String {
    if quoted(record_type) {
        format!("\"{}\"", canonical)
    } else {
        canonical.to_string()
    }
}

/// Strip one pair of surrounding double quotes, if both are present
fn unquote(raw: &str) -> &str {
    raw.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(raw)
}

/// Join the two trailing digest chunks of a spaced type
///
/// Values that do not have the expected shape are returned unchanged.
fn unspace(spacing: Spacing, value: &str) -> String {
    let numeric = spacing.numeric_fields();
    let fields: Vec<&str> = value.split_whitespace().collect();

    let matches = fields.len() == numeric + 2
        && fields[..numeric].iter().all(|f| is_digits(f))
        && fields[numeric..].iter().all(|f| is_word(f));

    if !matches {
        trace!(?spacing, value, "Spaced value does not match expected layout, leaving as is");
        return value.to_string();
    }

    format!(
        "{} {}{}",
        fields[..numeric].join(" "),
        fields[numeric],
        fields[numeric + 1]
    )
}

fn is_digits(field: &str) -> bool {
    !field.is_empty() && field.bytes().all(|b| b.is_ascii_digit())
}

fn is_word(field: &str) -> bool {
    !field.is_empty() && field.chars().all(|c| c.is_alphanumeric() || c == '_')
}
