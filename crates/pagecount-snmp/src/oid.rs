//! Dotted-decimal object identifiers.

use std::fmt;
use std::str::FromStr;

use snmp2::Oid;

use crate::error::OidParseError;

/// An SNMP object identifier such as `1.3.6.1.2.1.43.10.2.1.4.1.1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectIdentifier(Vec<u32>);

impl ObjectIdentifier {
    /// Numeric arcs of the identifier.
    #[must_use]
    pub fn arcs(&self) -> &[u32] {
        &self.0
    }

    /// Encodable form used in GET requests.
    ///
    /// # Errors
    ///
    /// Returns [`OidParseError::Unencodable`] when the arcs cannot be
    /// BER-encoded.
    pub fn to_snmp(&self) -> Result<Oid<'static>, OidParseError> {
        let arcs: Vec<u64> = self.0.iter().copied().map(u64::from).collect();
        Oid::from(&arcs).map_err(|_| OidParseError::Unencodable {
            input: self.to_string(),
        })
    }
}

impl FromStr for ObjectIdentifier {
    type Err = OidParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let body = trimmed.strip_prefix('.').unwrap_or(trimmed);
        if body.is_empty() {
            return Err(OidParseError::Empty);
        }

        let arcs = body
            .split('.')
            .map(|arc| {
                arc.parse::<u32>().map_err(|_| OidParseError::InvalidArc {
                    input: input.to_owned(),
                    arc: arc.to_owned(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if arcs.len() < 2 {
            return Err(OidParseError::TooShort {
                input: input.to_owned(),
            });
        }
        if arcs.first().is_some_and(|first| *first > 2) {
            return Err(OidParseError::Unencodable {
                input: input.to_owned(),
            });
        }
        let oid = Self(arcs);
        oid.to_snmp()?;
        Ok(oid)
    }
}

impl fmt::Display for ObjectIdentifier {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.0 {
            if !first {
                formatter.write_str(".")?;
            }
            write!(formatter, "{arc}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::printer_counter("1.3.6.1.2.1.43.10.2.1.4.1.1", 13)]
    #[case::leading_dot(".1.3.6.1.2.1.1.1.0", 9)]
    #[case::padded(" 1.3 ", 2)]
    fn parses_dotted_decimal(#[case] input: &str, #[case] arcs: usize) {
        let oid: ObjectIdentifier = input.parse().expect("valid oid");
        assert_eq!(oid.arcs().len(), arcs);
    }

    #[rstest]
    #[case::empty("")]
    #[case::only_dot(".")]
    #[case::double_dot("1..3")]
    #[case::letters("1.3.six")]
    #[case::negative("1.-3")]
    #[case::single_arc("1")]
    #[case::first_arc_too_large("7.3.6.1")]
    fn rejects_malformed_identifiers(#[case] input: &str) {
        assert!(input.parse::<ObjectIdentifier>().is_err());
    }

    #[test]
    fn converts_to_the_request_form() {
        let oid: ObjectIdentifier = "1.3.6.1.2.1.43.10.2.1.4.1.1".parse().expect("valid oid");
        assert!(oid.to_snmp().is_ok());
    }

    #[test]
    fn displays_without_leading_dot() {
        let oid: ObjectIdentifier = ".1.3.6.1".parse().expect("valid oid");
        assert_eq!(oid.to_string(), "1.3.6.1");
    }
}
