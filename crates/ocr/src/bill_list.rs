use std::sync::OnceLock;

use billsnap_core::datetime::format_long_date_time;
use billsnap_core::TransactionType;
use chrono::{DateTime, Datelike, TimeZone};
use regex::Regex;

use crate::types::RawRecognizedItem;

/// Description used when a line carries nothing but a date and an amount.
pub const FALLBACK_DESCRIPTION: &str = "OCR";

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

// Signed decimal anchored at the end of the line: -123.45, +5.23, 88
re!(re_trailing_amount, r"([+-]?[0-9]+(?:\.[0-9]*)?)\s*$");
// Month/day with time of day: 2月7日 21:49, 12月31日09:00
re!(re_month_day_time, r"([0-9]{1,2})月([0-9]{1,2})日\s*([0-9]{1,2}):([0-9]{2})");

/// Parser for bill-list screenshots (账单), one transaction per line:
/// `<description> <M>月<D>日 <HH>:<MM> <signed amount>`.
pub struct BillListParser;

impl BillListParser {
    /// Extract one raw item per transaction line, in input order.
    ///
    /// The source text has no year; it is taken from `reference_time`. Lines
    /// without a trailing amount or a month/day/time are skipped.
    pub fn parse<Tz: TimeZone>(text: &str, reference_time: &DateTime<Tz>) -> Vec<RawRecognizedItem> {
        let year = reference_time.year();
        text.lines()
            .filter_map(|line| Self::parse_line(line, year))
            .collect()
    }

    pub fn parse_line(line: &str, year: i32) -> Option<RawRecognizedItem> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let amount_caps = re_trailing_amount().captures(line)?;
        let amount = amount_caps.get(1)?.as_str();
        let rest = line[..amount_caps.get(0)?.start()].trim();

        let date_caps = re_month_day_time().captures(rest)?;
        let date_match = date_caps.get(0)?;
        let month: u32 = date_caps.get(1)?.as_str().parse().ok()?;
        let day: u32 = date_caps.get(2)?.as_str().parse().ok()?;
        let hour: u32 = date_caps.get(3)?.as_str().parse().ok()?;
        let minute: u32 = date_caps.get(4)?.as_str().parse().ok()?;

        let before = rest[..date_match.start()].trim();
        let after = rest[date_match.end()..].trim();
        let description = [before, after]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or(FALLBACK_DESCRIPTION);

        Some(RawRecognizedItem {
            transaction_type: Self::classify_by_sign(amount).to_string(),
            time: format_long_date_time(year, month, day, hour, minute),
            amount: amount.to_string(),
            description: description.to_string(),
            ..Default::default()
        })
    }

    /// A leading `-` is an expense; `+` or no sign is income.
    /// Transfers never come out of plain text.
    fn classify_by_sign(amount: &str) -> TransactionType {
        if amount.starts_with('-') {
            TransactionType::Expense
        } else {
            TransactionType::Income
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn reference(year: i32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(year, 6, 1, 12, 0, 0)
            .unwrap()
    }

    #[test]
    fn parses_two_line_bill() {
        let text = "京东超市 2月7日 21:49 -100.00\n余额宝收益 2月7日 22:10 +5.23\n";
        let items = BillListParser::parse(text, &reference(2026));
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].transaction_type, "expense");
        assert_eq!(items[0].time, "2026-02-07 21:49:00");
        assert_eq!(items[0].amount, "-100.00");
        assert_eq!(items[0].description, "京东超市");

        assert_eq!(items[1].transaction_type, "income");
        assert_eq!(items[1].time, "2026-02-07 22:10:00");
        assert_eq!(items[1].amount, "+5.23");
        assert_eq!(items[1].description, "余额宝收益");
    }

    #[test]
    fn unsigned_amount_is_income() {
        let item = BillListParser::parse_line("工资 3月1日 09:00 8000.00", 2026).unwrap();
        assert_eq!(item.transaction_type, "income");
        assert_eq!(item.amount, "8000.00");
    }

    #[test]
    fn structure_fields_are_left_empty() {
        let item = BillListParser::parse_line("京东超市 2月7日 21:49 -100.00", 2026).unwrap();
        assert!(item.account_name.is_empty());
        assert!(item.destination_account_name.is_empty());
        assert!(item.category_name.is_empty());
        assert!(item.destination_amount.is_empty());
        assert!(item.tag_names.is_empty());
    }

    #[test]
    fn description_falls_back_to_text_after_date() {
        let item = BillListParser::parse_line("2月7日 21:49 京东超市 -100.00", 2026).unwrap();
        assert_eq!(item.description, "京东超市");
    }

    #[test]
    fn description_falls_back_to_placeholder() {
        let item = BillListParser::parse_line("2月7日 21:49 -100.00", 2026).unwrap();
        assert_eq!(item.description, FALLBACK_DESCRIPTION);
    }

    #[test]
    fn date_without_space_before_time() {
        let item = BillListParser::parse_line("美团 12月31日09:05 -23.5", 2025).unwrap();
        assert_eq!(item.time, "2025-12-31 09:05:00");
        assert_eq!(item.amount, "-23.5");
    }

    #[test]
    fn single_digit_hour_is_padded() {
        let item = BillListParser::parse_line("早餐 1月2日 7:30 -8", 2026).unwrap();
        assert_eq!(item.time, "2026-01-02 07:30:00");
    }

    #[test]
    fn lines_without_amount_or_date_are_dropped() {
        let text = "交易明细\n全部账单 2月\n京东超市 2月7日 21:49\n收入 +5.23\n\n   \n";
        assert!(BillListParser::parse(text, &reference(2026)).is_empty());
    }

    #[test]
    fn bad_lines_do_not_affect_neighbours() {
        let text = "header line\n京东超市 2月7日 21:49 -100.00\nnoise 42\n滴滴出行 2月8日 08:15 -31.20";
        let items = BillListParser::parse(text, &reference(2026));
        let descriptions: Vec<_> = items.iter().map(|i| i.description.as_str()).collect();
        assert_eq!(descriptions, vec!["京东超市", "滴滴出行"]);
    }

    #[test]
    fn only_trailing_number_is_the_amount() {
        let item = BillListParser::parse_line("订单 12345 2月7日 21:49 -66.00", 2026).unwrap();
        assert_eq!(item.amount, "-66.00");
        assert_eq!(item.description, "订单 12345");
    }

    #[test]
    fn crlf_line_endings() {
        let text = "京东超市 2月7日 21:49 -100.00\r\n余额宝收益 2月7日 22:10 +5.23\r\n";
        assert_eq!(BillListParser::parse(text, &reference(2026)).len(), 2);
    }

    #[test]
    fn impossible_dates_still_produce_an_item() {
        // Validation of the calendar date happens during assembly.
        let item = BillListParser::parse_line("test 2月30日 10:00 -1.00", 2026).unwrap();
        assert_eq!(item.time, "2026-02-30 10:00:00");
    }

    #[test]
    fn year_follows_reference_time() {
        let item = &BillListParser::parse("a 5月5日 10:00 -1", &reference(2031))[0];
        assert!(item.time.starts_with("2031-05-05"));
    }

    #[test]
    fn parse_is_deterministic() {
        let text = "京东超市 2月7日 21:49 -100.00\nfoo\n余额宝收益 2月7日 22:10 +5.23";
        assert_eq!(
            BillListParser::parse(text, &reference(2026)),
            BillListParser::parse(text, &reference(2026))
        );
    }
}
