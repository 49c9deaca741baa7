/*
 * date.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Corriere, a blocking HTTP/1.1 client transport.
 *
 * Corriere is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Corriere is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Corriere.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Cookie `Expires` dates.
//!
//! Accepts the RFC 1123 form servers should send (`Wed, 21 Oct 2015 07:28:00 GMT`) and the
//! variants still seen in the wild: dashed dates (`21-Oct-2015`), RFC 850 (`Wednesday,
//! 21-Oct-15 07:28:00 GMT`) and asctime (`Wed Oct 21 07:28:00 2015`).

use chrono::{DateTime, NaiveDateTime};

/// Parse a cookie date into epoch seconds. Returns None on parse failure.
pub fn parse_cookie_date(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    parse_rfc1123_like(value).or_else(|| {
        NaiveDateTime::parse_from_str(value, "%a %b %e %H:%M:%S %Y")
            .ok()
            .map(|dt| dt.and_utc().timestamp())
    })
}

/// Day, month, year, time and zone after an optional `Weekday,` prefix.
fn parse_rfc1123_like(value: &str) -> Option<i64> {
    let body = value.split_once(',').map(|(_, rest)| rest).unwrap_or(value);
    let mut tokens = body.split_whitespace();
    let mut fields: Vec<String> = Vec::with_capacity(5);
    let first = tokens.next()?;
    if first.contains('-') {
        fields.extend(first.split('-').map(str::to_string));
    } else {
        fields.push(first.to_string());
    }
    fields.extend(tokens.map(str::to_string));
    if fields.len() < 4 || fields.len() > 5 {
        return None;
    }
    fields[2] = four_digit_year(&fields[2])?;
    let zone = fields.get(4).map(|z| convert_zone(z)).unwrap_or("+0000".to_string());
    let normalized = format!("{} {} {} {} {}", fields[0], fields[1], fields[2], fields[3], zone);
    DateTime::parse_from_str(&normalized, "%d %b %Y %H:%M:%S %z")
        .ok()
        .map(|dt| dt.timestamp())
}

/// Two-digit years: 70-99 are 19xx, 00-69 are 20xx.
fn four_digit_year(year: &str) -> Option<String> {
    if !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match year.len() {
        2 => {
            let yy: u32 = year.parse().ok()?;
            let full = if yy < 70 { 2000 + yy } else { 1900 + yy };
            Some(full.to_string())
        }
        4 => Some(year.to_string()),
        _ => None,
    }
}

fn convert_zone(zone: &str) -> String {
    match zone.to_ascii_uppercase().as_str() {
        "GMT" | "UT" | "UTC" | "Z" => "+0000".to_string(),
        _ => zone.to_string(),
    }
}
