//! Issuance
//!
//! Creates coupons with unique generated codes and a default expiry.

use clap::Args;
use jiff::{ToSpan, civil::Date};
use rand::seq::SliceRandom;
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::{debug, info};

use crate::coupons::{Coupon, CouponError, NewCoupon};

/// Default number of characters in a generated code.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Default number of codes tried before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 32;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Coupon issuance settings.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct IssueConfig {
    /// Number of characters in generated coupon codes
    #[arg(long, env = "COUPON_CODE_LENGTH", default_value_t = DEFAULT_CODE_LENGTH)]
    pub code_length: usize,

    /// Days a new coupon stays valid, counted from its issue date
    #[arg(long, env = "COUPON_VALID_FOR_DAYS")]
    pub valid_for_days: Option<u32>,

    /// Codes to try before giving up on finding an unused one
    #[arg(long, env = "COUPON_CODE_MAX_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
}

impl Default for IssueConfig {
    fn default() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            valid_for_days: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Errors from issuing a coupon.
#[derive(Debug, Error)]
pub enum IssueError {
    /// Every generated code was already taken.
    #[error("no unused coupon code found after {attempts} attempts")]
    CodesExhausted {
        /// Number of codes tried.
        attempts: u32,
    },

    /// The default expiry date is out of range.
    #[error("cannot compute expiry {days} days after {issued_on}")]
    Expiry {
        /// Issue date.
        issued_on: Date,

        /// Configured validity period.
        days: u32,

        /// Underlying date arithmetic error.
        #[source]
        source: jiff::Error,
    },

    /// The coupon definition is invalid.
    #[error(transparent)]
    Coupon(#[from] CouponError),
}

/// Source of candidate coupon codes.
pub trait CodeGenerator {
    /// Produce a candidate code of `length` characters.
    fn generate(&mut self, length: usize) -> String;
}

/// Generates uppercase alphanumeric codes from the thread RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&mut self, length: usize) -> String {
        let mut rng = rand::thread_rng();

        (0..length)
            .filter_map(|_| CODE_ALPHABET.choose(&mut rng))
            .map(|byte| char::from(*byte))
            .collect()
    }
}

/// Lookup of codes already in use.
pub trait CodeRegistry {
    /// Whether `code` belongs to an existing coupon.
    fn is_taken(&self, code: &str) -> bool;
}

/// Registry backed by a hash set.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCodeRegistry {
    codes: FxHashSet<String>,
}

impl InMemoryCodeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `code` as used. Returns `false` if it already was.
    pub fn reserve(&mut self, code: impl Into<String>) -> bool {
        self.codes.insert(code.into())
    }

    /// Number of reserved codes.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether no codes are reserved.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl CodeRegistry for InMemoryCodeRegistry {
    fn is_taken(&self, code: &str) -> bool {
        self.codes.contains(code)
    }
}

/// Issue a coupon on `today` with a code unused in `registry`.
///
/// When `config.valid_for_days` is set and `new_coupon` has no `expires_on`,
/// the coupon expires that many days after `today`. The code isn't reserved;
/// callers persist the coupon and record its code themselves.
///
/// # Errors
///
/// - [`IssueError::CodesExhausted`]: `config.max_attempts` codes were all taken.
/// - [`IssueError::Expiry`]: the computed expiry date is out of range.
/// - [`IssueError::Coupon`]: the resulting coupon is invalid.
#[tracing::instrument(name = "coupons.issuance.issue", skip_all, fields(discount_type = %new_coupon.discount_type))]
pub fn issue<G, R>(
    mut new_coupon: NewCoupon,
    config: &IssueConfig,
    generator: &mut G,
    registry: &R,
    today: Date,
) -> Result<Coupon, IssueError>
where
    G: CodeGenerator + ?Sized,
    R: CodeRegistry + ?Sized,
{
    let code = unused_code(config, generator, registry)?;

    if let (None, Some(days)) = (new_coupon.expires_on, config.valid_for_days) {
        let expires_on =
            today
                .checked_add(i64::from(days).days())
                .map_err(|source| IssueError::Expiry {
                    issued_on: today,
                    days,
                    source,
                })?;

        new_coupon.expires_on = Some(expires_on);
    }

    let coupon = Coupon::new(code, new_coupon)?;

    info!(
        coupon_code = %coupon.code(),
        expires_on = ?coupon.expires_on(),
        "issued coupon"
    );

    Ok(coupon)
}

fn unused_code<G, R>(config: &IssueConfig, generator: &mut G, registry: &R) -> Result<String, IssueError>
where
    G: CodeGenerator + ?Sized,
    R: CodeRegistry + ?Sized,
{
    for attempt in 1..=config.max_attempts {
        let code = generator.generate(config.code_length);

        if !registry.is_taken(&code) {
            return Ok(code);
        }

        debug!(attempt, "generated coupon code already taken");
    }

    Err(IssueError::CodesExhausted {
        attempts: config.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use clap::Parser;
    use jiff::civil::date;
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::discounts::DiscountType;

    use super::*;

    /// Hands out a fixed sequence of codes.
    struct ScriptedGenerator(VecDeque<&'static str>);

    impl CodeGenerator for ScriptedGenerator {
        fn generate(&mut self, _length: usize) -> String {
            self.0.pop_front().unwrap_or_default().to_string()
        }
    }

    #[derive(Debug, Parser)]
    struct Cli {
        #[command(flatten)]
        issue: IssueConfig,
    }

    fn ten_off() -> NewCoupon {
        NewCoupon::new(DiscountType::DollarOffOrder, Decimal::TEN)
    }

    #[test]
    fn random_codes_are_uppercase_alphanumeric() {
        let mut generator = RandomCodeGenerator;

        for length in [0, 1, 6, 20] {
            let code = generator.generate(length);

            assert_eq!(code.len(), length);
            assert!(
                code.chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            );
        }
    }

    #[test]
    fn issue_skips_taken_codes() -> TestResult {
        let mut registry = InMemoryCodeRegistry::new();
        registry.reserve("AAAAAA");
        registry.reserve("BBBBBB");

        let mut generator = ScriptedGenerator(["AAAAAA", "BBBBBB", "CCCCCC"].into());

        let coupon = issue(
            ten_off(),
            &IssueConfig::default(),
            &mut generator,
            &registry,
            date(2024, 1, 1),
        )?;

        assert_eq!(coupon.code(), "CCCCCC");

        Ok(())
    }

    #[test]
    fn issue_gives_up_after_max_attempts() {
        let mut registry = InMemoryCodeRegistry::new();
        registry.reserve("TAKEN");

        let mut generator = ScriptedGenerator(["TAKEN", "TAKEN", "TAKEN", "FREE"].into());
        let config = IssueConfig {
            max_attempts: 3,
            ..IssueConfig::default()
        };

        let result = issue(ten_off(), &config, &mut generator, &registry, date(2024, 1, 1));

        assert!(matches!(
            result,
            Err(IssueError::CodesExhausted { attempts: 3 })
        ));
    }

    #[test]
    fn issue_sets_default_expiry() -> TestResult {
        let config = IssueConfig {
            valid_for_days: Some(30),
            ..IssueConfig::default()
        };

        let coupon = issue(
            ten_off(),
            &config,
            &mut RandomCodeGenerator,
            &InMemoryCodeRegistry::new(),
            date(2024, 1, 1),
        )?;

        assert_eq!(coupon.expires_on(), Some(date(2024, 1, 31)));
        assert_eq!(coupon.code().len(), DEFAULT_CODE_LENGTH);

        Ok(())
    }

    #[test]
    fn issue_keeps_explicit_expiry() -> TestResult {
        let config = IssueConfig {
            valid_for_days: Some(30),
            ..IssueConfig::default()
        };

        let coupon = issue(
            NewCoupon {
                expires_on: Some(date(2024, 12, 25)),
                ..ten_off()
            },
            &config,
            &mut RandomCodeGenerator,
            &InMemoryCodeRegistry::new(),
            date(2024, 1, 1),
        )?;

        assert_eq!(coupon.expires_on(), Some(date(2024, 12, 25)));

        Ok(())
    }

    #[test]
    fn issue_without_validity_period_never_expires() -> TestResult {
        let coupon = issue(
            ten_off(),
            &IssueConfig::default(),
            &mut RandomCodeGenerator,
            &InMemoryCodeRegistry::new(),
            date(2024, 1, 1),
        )?;

        assert_eq!(coupon.expires_on(), None);

        Ok(())
    }

    #[test]
    fn issue_rejects_invalid_coupon() {
        let result = issue(
            NewCoupon {
                begin_date: Some(date(2024, 2, 1)),
                ..ten_off()
            },
            &IssueConfig {
                valid_for_days: Some(7),
                ..IssueConfig::default()
            },
            &mut RandomCodeGenerator,
            &InMemoryCodeRegistry::new(),
            date(2024, 1, 1),
        );

        assert!(matches!(
            result,
            Err(IssueError::Coupon(CouponError::DateWindow { .. }))
        ));
    }

    #[test]
    fn config_defaults_match_cli_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["issue"])?;

        assert_eq!(cli.issue, IssueConfig::default());

        Ok(())
    }

    #[test]
    fn config_parses_flags() -> TestResult {
        let cli = Cli::try_parse_from([
            "issue",
            "--code-length",
            "10",
            "--valid-for-days",
            "14",
            "--max-attempts",
            "5",
        ])?;

        assert_eq!(
            cli.issue,
            IssueConfig {
                code_length: 10,
                valid_for_days: Some(14),
                max_attempts: 5,
            }
        );

        Ok(())
    }
}
