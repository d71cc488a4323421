pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Parses `"HH:MM"` into minutes since midnight.
///
/// Hours past 23 are accepted and wrap on the running clock.
pub fn parse_clock(text: &str) -> Option<u32> {
    let (hours, minutes) = text.trim().split_once(':')?;
    let hours: u32 = hours.trim().parse().ok()?;
    let minutes: u32 = minutes.trim().parse().ok()?;
    hours.checked_mul(60)?.checked_add(minutes)
}

pub fn clock_or(text: Option<&str>, fallback: u32) -> u32 {
    match text.and_then(parse_clock) {
        Some(minutes) => minutes,
        None => {
            if let Some(text) = text {
                log::debug!("Ignoring malformed clock time {:?}", text);
            }
            fallback
        }
    }
}

/// Strict wall-clock time for user input, `00:00` to `23:59`.
pub fn parse_wall_clock(text: &str) -> Option<u32> {
    let (hours, minutes) = text.trim().split_once(':')?;
    let hours: u32 = hours.trim().parse().ok()?;
    let minutes: u32 = minutes.trim().parse().ok()?;
    (hours < 24 && minutes < 60).then_some(hours * 60 + minutes)
}

/// Moves the clock forward, keeping it within one day.
pub fn advance_clock(clock: u32, minutes: u32) -> u32 {
    (clock % MINUTES_PER_DAY + minutes % MINUTES_PER_DAY) % MINUTES_PER_DAY
}

pub fn format_clock(minutes: u32) -> String {
    let minutes = minutes % MINUTES_PER_DAY;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// `"-"`, `"Overnight"`, absent values and anything unrecognized count as
/// zero minutes. Minutes only read the leading whole number, `"1.5 min"` is 1.
pub fn parse_stay(text: Option<&str>) -> u32 {
    let Some(text) = text.map(str::trim) else {
        return 0;
    };
    if let Some(hours) = text.strip_suffix("hr") {
        return match hours.trim().parse::<f64>() {
            Ok(hours) if hours.is_finite() && hours >= 0.0 => (hours * 60.0).round() as u32,
            _ => 0,
        };
    }
    if let Some(minutes) = text.strip_suffix("min") {
        let minutes = minutes.trim();
        let digits = minutes
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(minutes.len());
        return minutes[..digits].parse::<u32>().unwrap_or(0);
    }
    0
}

pub fn format_duration(minutes: u32) -> String {
    if minutes >= 60 {
        format!("{}h{}m", minutes / 60, minutes % 60)
    } else {
        format!("{}m", minutes)
    }
}
