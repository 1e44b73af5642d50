//! E.164 phone number splitting.
//!
//! ITU country calling codes form a prefix-free set, so the calling code of
//! a `+`-prefixed number is the unique table entry its digits start with.

/// ITU-T E.164 country calling codes.
const CALLING_CODES: &[&str] = &[
    "1", "7", "20", "27", "30", "31", "32", "33", "34", "36", "39", "40", "41", "43", "44", "45",
    "46", "47", "48", "49", "51", "52", "53", "54", "55", "56", "57", "58", "60", "61", "62",
    "63", "64", "65", "66", "81", "82", "84", "86", "90", "91", "92", "93", "94", "95", "98",
    "211", "212", "213", "216", "218", "220", "221", "222", "223", "224", "225", "226", "227",
    "228", "229", "230", "231", "232", "233", "234", "235", "236", "237", "238", "239", "240",
    "241", "242", "243", "244", "245", "246", "248", "249", "250", "251", "252", "253", "254",
    "255", "256", "257", "258", "260", "261", "262", "263", "264", "265", "266", "267", "268",
    "269", "290", "291", "297", "298", "299", "350", "351", "352", "353", "354", "355", "356",
    "357", "358", "359", "370", "371", "372", "373", "374", "375", "376", "377", "378", "380",
    "381", "382", "383", "385", "386", "387", "389", "420", "421", "423", "500", "501", "502",
    "503", "504", "505", "506", "507", "508", "509", "590", "591", "592", "593", "594", "595",
    "596", "597", "598", "599", "670", "672", "673", "674", "675", "676", "677", "678", "679",
    "680", "681", "682", "683", "685", "686", "687", "688", "689", "690", "691", "692", "850",
    "852", "853", "855", "856", "880", "886", "960", "961", "962", "963", "964", "965", "966",
    "967", "968", "970", "971", "972", "973", "974", "975", "976", "977", "992", "993", "994",
    "995", "996", "998",
];

/// Shortest and longest national significant number lengths accepted.
const NATIONAL_LEN: std::ops::RangeInclusive<usize> = 4..=14;

/// A number split into `+<code>` and national digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitNumber {
    /// `+` followed by the calling code.
    pub country_code: String,
    /// National significant number, digits only.
    pub national_number: String,
}

/// Split an international number such as `+1 (415) 555-0123`.
///
/// Formatting characters (spaces, dashes, dots, parentheses) are ignored.
/// Returns `None` for numbers without a leading `+`, with other
/// characters, with an unknown calling code, or with an implausible
/// national length.
pub fn split_e164(raw: &str) -> Option<SplitNumber> {
    let rest = raw.trim().strip_prefix('+')?;
    let mut digits = String::with_capacity(rest.len());
    for c in rest.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return None,
        }
    }
    let code = CALLING_CODES.iter().find(|code| digits.starts_with(*code))?;
    let national = &digits[code.len()..];
    if !NATIONAL_LEN.contains(&national.len()) {
        return None;
    }
    Some(SplitNumber {
        country_code: format!("+{code}"),
        national_number: national.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_common_numbers() {
        assert_eq!(
            split_e164("+14155550123"),
            Some(SplitNumber {
                country_code: "+1".into(),
                national_number: "4155550123".into()
            })
        );
        assert_eq!(
            split_e164("+44 20 7946 0958").map(|s| s.country_code),
            Some("+44".into())
        );
        assert_eq!(
            split_e164("+353 (1) 555-0199").map(|s| (s.country_code, s.national_number)),
            Some(("+353".into(), "15550199".into()))
        );
    }

    #[test]
    fn rejects_malformed_numbers() {
        assert_eq!(split_e164("4155550123"), None);
        assert_eq!(split_e164("+1415abc0123"), None);
        assert_eq!(split_e164("+1"), None);
        assert_eq!(split_e164(""), None);
        // 28x is unassigned.
        assert_eq!(split_e164("+2801234567"), None);
    }

    #[test]
    fn calling_codes_are_prefix_free() {
        for a in CALLING_CODES {
            for b in CALLING_CODES {
                if a != b {
                    assert!(!b.starts_with(a), "{a} is a prefix of {b}");
                }
            }
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn split_inverts_compose(
                code in prop::sample::select(CALLING_CODES),
                national in "[0-9]{4,14}",
            ) {
                let split = split_e164(&format!("+{code}{national}"));
                prop_assert_eq!(
                    split,
                    Some(SplitNumber {
                        country_code: format!("+{code}"),
                        national_number: national,
                    })
                );
            }
        }
    }
}
