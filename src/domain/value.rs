use crate::domain::validation::ValidationError;

use phonenumber::country;

macro_rules! trimmed_string {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Field name used on the wire (`", $field, "`).")]
            pub const FIELD: &'static str = $field;

            #[doc = concat!("Create a validated [`", stringify!($name), "`].")]
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::Empty { field: Self::FIELD });
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Borrow the validated value.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

trimmed_string!(
    /// Vonage account API key; also identifies subaccounts.
    ///
    /// Invariant: non-empty after trimming.
    ApiKey,
    "api_key"
);

trimmed_string!(
    /// Vonage application id used as the JWT `application_id` claim.
    ///
    /// Invariant: non-empty after trimming.
    ApplicationId,
    "application_id"
);

trimmed_string!(
    /// Proactive Connect list id.
    ListId,
    "list_id"
);

trimmed_string!(
    /// Proactive Connect list item id.
    ListItemId,
    "item_id"
);

trimmed_string!(
    /// Message id returned by the Messages API.
    MessageUuid,
    "message_uuid"
);

trimmed_string!(
    /// Account secret id.
    SecretId,
    "secret_id"
);

#[derive(Clone, PartialEq, Eq, Hash)]
/// Account API secret.
///
/// Invariant: must not be empty (whitespace is preserved and allowed).
pub struct ApiSecret(String);

impl ApiSecret {
    /// Field name used on the wire (`api_secret`).
    pub const FIELD: &'static str = "api_secret";

    /// Create a validated [`ApiSecret`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(value))
    }

    /// Borrow the secret as provided.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiSecret(***)")
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
/// New secret for an account or subaccount.
///
/// Invariant: 8..=25 characters with at least one lowercase letter, one
/// uppercase letter and one digit.
pub struct AccountSecret(String);

impl AccountSecret {
    /// Field name used on the wire (`secret`).
    pub const FIELD: &'static str = "secret";
    /// Minimum secret length.
    pub const MIN_LEN: usize = 8;
    /// Maximum secret length.
    pub const MAX_LEN: usize = 25;

    /// Create a validated [`AccountSecret`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        check_length(Self::FIELD, &value, Self::MIN_LEN, Self::MAX_LEN)?;
        if !value.chars().any(|c| c.is_ascii_lowercase()) {
            return Err(ValidationError::InvalidFormat {
                field: Self::FIELD,
                reason: "must contain a lowercase letter",
            });
        }
        if !value.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::InvalidFormat {
                field: Self::FIELD,
                reason: "must contain an uppercase letter",
            });
        }
        if !value.chars().any(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidFormat {
                field: Self::FIELD,
                reason: "must contain a digit",
            });
        }
        Ok(Self(value))
    }

    /// Borrow the secret as provided.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccountSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccountSecret(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Phone number in E.164 form without the leading `+`, as the Vonage APIs expect it.
///
/// Construction strips `+`, a `00` international prefix, spaces, dashes, dots and
/// parentheses. Invariant: 7..=15 ASCII digits, no leading zero.
pub struct E164Number(String);

impl E164Number {
    /// Field name used on the wire (`to`).
    pub const FIELD: &'static str = "to";
    /// Minimum digit count.
    pub const MIN_DIGITS: usize = 7;
    /// Maximum digit count (E.164 limit).
    pub const MAX_DIGITS: usize = 15;

    /// Normalize and validate an international phone number.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let input = value.into();
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }

        let mut digits = String::with_capacity(trimmed.len());
        for (idx, c) in trimmed.chars().enumerate() {
            match c {
                '0'..='9' => digits.push(c),
                '+' if idx == 0 => {}
                ' ' | '-' | '.' | '(' | ')' => {}
                _ => return Err(ValidationError::InvalidPhoneNumber { input }),
            }
        }

        let digits = match digits.strip_prefix("00") {
            Some(rest) => rest.to_owned(),
            None => digits,
        };

        if digits.starts_with('0')
            || !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits.len())
        {
            return Err(ValidationError::InvalidPhoneNumber { input });
        }
        Ok(Self(digits))
    }

    /// Digits without the leading `+`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<PhoneNumber> for E164Number {
    fn from(value: PhoneNumber) -> Self {
        Self(value.e164.trim_start_matches('+').to_owned())
    }
}

impl std::fmt::Display for E164Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
/// Parsed phone number with an E.164 representation.
///
/// Use this when the input is in national format and needs a default region.
/// Equality, ordering, and hashing are based on the E.164 form.
pub struct PhoneNumber {
    raw: String,
    e164: String,
    parsed: phonenumber::PhoneNumber,
}

impl PhoneNumber {
    /// Field name used on the wire (`to`).
    pub const FIELD: &'static str = "to";

    /// Parse and normalize a phone number into E.164.
    ///
    /// `default_region` is used when the input does not contain an explicit country prefix.
    pub fn parse(
        default_region: Option<country::Id>,
        input: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let input = input.into();
        let raw = input.trim().to_owned();
        if raw.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }

        let parsed = phonenumber::parse(default_region, &raw)
            .map_err(|_| ValidationError::InvalidPhoneNumber { input: raw.clone() })?;

        let e164 = phonenumber::format(&parsed)
            .mode(phonenumber::Mode::E164)
            .to_string();

        Ok(Self { raw, e164, parsed })
    }

    /// Raw input after trimming.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Normalized E.164 representation (with `+`).
    pub fn e164(&self) -> &str {
        &self.e164
    }

    /// The parsed phone number from the `phonenumber` crate.
    pub fn parsed(&self) -> &phonenumber::PhoneNumber {
        &self.parsed
    }
}

impl PartialEq for PhoneNumber {
    fn eq(&self, other: &Self) -> bool {
        self.e164 == other.e164
    }
}

impl Eq for PhoneNumber {}

impl std::hash::Hash for PhoneNumber {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.e164.hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// ISO 3166-1 alpha-2 country code, stored uppercase.
pub struct CountryCode(String);

impl CountryCode {
    /// Field name used on the wire (`country`).
    pub const FIELD: &'static str = "country";

    /// Create a validated [`CountryCode`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        if trimmed.len() != 2 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidFormat {
                field: Self::FIELD,
                reason: "expected a two-letter ISO 3166-1 code",
            });
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Borrow the uppercase code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Absolute `http`/`https` URL used for webhooks and media.
///
/// Invariant: parses as an absolute URL with an `http` or `https` scheme.
pub struct WebUrl(String);

impl WebUrl {
    /// Create a validated [`WebUrl`]; `field` names the wire field in errors.
    pub fn new(field: &'static str, value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field });
        }
        let parsed = url::Url::parse(trimmed).map_err(|_| ValidationError::InvalidFormat {
            field,
            reason: "expected an absolute URL",
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ValidationError::InvalidFormat {
                field,
                reason: "expected an http or https URL",
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the URL as provided (trimmed).
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Check that `value` has `min..=max` characters.
pub(crate) fn check_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual < min || actual > max {
        return Err(ValidationError::Length {
            field,
            min,
            max,
            actual,
        });
    }
    Ok(())
}

/// Check that `value` lies in `min..=max`.
pub(crate) fn check_range(
    field: &'static str,
    value: i64,
    min: i64,
    max: i64,
) -> Result<(), ValidationError> {
    if !(min..=max).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            actual: value,
        });
    }
    Ok(())
}
