//! User-facing message formatting. Kept apart from the flow logic so the
//! handlers read as state transitions, not string concatenation.

use chrono::NaiveDateTime;

use crate::core::summary::DailySummary;
use crate::error::AttendanceError;
use crate::model::attendance::AttendanceRecord;
use crate::model::schedule::WorkHours;

pub fn welcome(first_name: &str, hours: WorkHours, radius_m: f64) -> String {
    format!(
        "Welcome back, {first_name}!\n\
         Work hours today: {} - {}\n\
         Attendance radius: {radius_m:.0}m around the office.\n\
         Share your location to check in or out.",
        hours.start.format("%H:%M"),
        hours.end.format("%H:%M"),
    )
}

pub fn registration_needed() -> String {
    "You are not registered yet. Share your contact card to register.".into()
}

pub fn registered(first_name: &str) -> String {
    format!("Registered successfully. Welcome aboard, {first_name}!")
}

pub fn checked_in(record: &AttendanceRecord) -> String {
    let mut text = format!(
        "Checked in at {} ({:.0}m from the office).",
        record.check_in.time.format("%H:%M:%S"),
        record.check_in.distance_m,
    );
    if record.is_late {
        text.push_str("\nRecorded as late");
        if let Some(reason) = &record.late_reason {
            text.push_str(&format!(": {reason}"));
        }
        text.push('.');
    }
    text
}

pub fn checked_out(record: &AttendanceRecord, now: NaiveDateTime) -> String {
    let minutes = record.worked_minutes(now);
    let mut text = match record.check_out {
        Some(out) => format!(
            "Checked out at {} ({:.0}m from the office).\nWork duration: {}h {}m.",
            out.time.format("%H:%M:%S"),
            out.distance_m,
            minutes / 60,
            minutes % 60,
        ),
        None => "Checked out.".to_string(),
    };
    if record.is_early_checkout {
        text.push_str("\nRecorded as an early departure");
        if let Some(reason) = &record.early_checkout_reason {
            text.push_str(&format!(": {reason}"));
        }
        text.push('.');
    }
    text
}

pub fn late_reason_prompt(expected_start: chrono::NaiveTime, now: NaiveDateTime) -> String {
    format!(
        "Late check-in: work starts at {} and it is now {}.\n\
         Reply with the reason for being late; your check-in is recorded once the reason arrives.",
        expected_start.format("%H:%M"),
        now.format("%H:%M"),
    )
}

pub fn early_reason_prompt(expected_end: chrono::NaiveTime, now: NaiveDateTime) -> String {
    format!(
        "Early check-out: work ends at {} and it is only {}.\n\
         Reply with the reason for leaving early; your check-out is recorded once the reason arrives.",
        expected_end.format("%H:%M"),
        now.format("%H:%M"),
    )
}

pub fn pending_replaced(replaced: &str) -> String {
    format!("Your previous pending {replaced} was replaced by this attempt.")
}

pub fn pending_cancelled(described: &str) -> String {
    format!("Pending {described} cancelled.")
}

pub fn status(record: Option<&AttendanceRecord>, hours: WorkHours, now: NaiveDateTime) -> String {
    match record {
        None => format!(
            "Not checked in today.\nWork hours: {} - {}.",
            hours.start.format("%H:%M"),
            hours.end.format("%H:%M"),
        ),
        Some(r) => {
            let minutes = r.worked_minutes(now);
            match r.check_out {
                Some(out) => format!(
                    "Checked in {} | checked out {} | worked {}h {}m.",
                    r.check_in.time.format("%H:%M:%S"),
                    out.time.format("%H:%M:%S"),
                    minutes / 60,
                    minutes % 60,
                ),
                None => format!(
                    "Checked in {} | still working ({}h {}m so far).",
                    r.check_in.time.format("%H:%M:%S"),
                    minutes / 60,
                    minutes % 60,
                ),
            }
        }
    }
}

pub fn history(records: &[AttendanceRecord]) -> String {
    if records.is_empty() {
        return "No attendance records yet.".into();
    }
    let mut text = String::from("Recent attendance:\n");
    for r in records {
        text.push_str(&format!("{}: in {}", r.date, r.check_in.time.format("%H:%M")));
        if r.is_late {
            text.push_str(" (late)");
        }
        match r.check_out {
            Some(out) => {
                text.push_str(&format!(", out {}", out.time.format("%H:%M")));
                if r.is_early_checkout {
                    text.push_str(" (early)");
                }
            }
            None => text.push_str(", no check-out"),
        }
        text.push('\n');
    }
    text
}

pub fn summary(s: &DailySummary) -> String {
    let mut text = format!(
        "Daily attendance summary for {}\n\
         Employees: {} | checked in: {} | checked out: {} | still working: {}\n\
         Late: {} | early departures: {}\n\
         Attendance rate: {:.1}%\n",
        s.date,
        s.total_employees,
        s.checked_in,
        s.checked_out,
        s.still_working,
        s.late,
        s.early_checkout,
        s.attendance_rate,
    );
    if !s.late_arrivals.is_empty() {
        text.push_str("Late arrivals:\n");
        for entry in &s.late_arrivals {
            text.push_str(&format!(
                "  {} at {} ({})\n",
                entry.name,
                entry.time.format("%H:%M"),
                entry.reason.as_deref().unwrap_or("no reason provided"),
            ));
        }
    }
    if !s.early_departures.is_empty() {
        text.push_str("Early departures:\n");
        for entry in &s.early_departures {
            text.push_str(&format!(
                "  {} at {} ({})\n",
                entry.name,
                entry.time.format("%H:%M"),
                entry.reason.as_deref().unwrap_or("no reason provided"),
            ));
        }
    }
    text
}

pub fn help(is_admin: bool) -> String {
    let mut text = String::from(
        "Commands:\n\
         /start - welcome and today's hours\n\
         /register - register with your contact card\n\
         /status - today's attendance\n\
         /report - last 7 days\n\
         /cancel - drop a pending reason prompt\n\
         Share a location to check in or out.",
    );
    if is_admin {
        text.push_str(
            "\nAdmin:\n\
             /summary - today's summary\n\
             /all_report - every employee today\n\
             /set_hours <id> <YYYY-MM-DD> <start> <end> <reason> - exceptional hours\n\
             /add_admin <id> | /remove_admin <id>",
        );
    }
    text
}

/// Maps an engine rejection to the text the user sees. Every code gets a
/// distinct, actionable message; nothing is swallowed.
pub fn rejection(err: &AttendanceError) -> String {
    match err {
        AttendanceError::OutOfRange { distance_m, radius_m } => format!(
            "Location check failed: you are {distance_m:.0}m from the office; \
             attendance is only accepted within {radius_m:.0}m. Move closer and try again."
        ),
        AttendanceError::DuplicateCheckIn => {
            "You already have an attendance record for today.".into()
        }
        AttendanceError::CheckOutWithoutCheckIn => {
            "No open check-in today; check in before checking out.".into()
        }
        AttendanceError::InvalidOrder => {
            "That check-out time is before your recorded check-in; nothing was recorded.".into()
        }
        AttendanceError::NoPendingReason => {
            "Nothing is awaiting a reason right now. Use /help for commands.".into()
        }
        AttendanceError::EmptyReason => {
            "A reason is required. Reply with a few words explaining why.".into()
        }
        AttendanceError::UnknownEmployee(_) => registration_needed(),
        AttendanceError::InvalidCoordinate => {
            "That location payload is malformed; share your position again.".into()
        }
        AttendanceError::UnauthorizedAdminAction => "You do not have admin privileges.".into(),
        AttendanceError::Store(_) => "Temporary storage problem; please try again.".into(),
    }
}
