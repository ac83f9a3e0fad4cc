use crate::error::ValidationError;
use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static! {
    static ref BIRTHDATE_REGEX: Regex = Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})").unwrap();
}

/// Worksheet holding applicant rows
pub const APPLICANTS_WORKSHEET: &str = "Applicants";

/// Worksheet holding feedback rows
pub const FEEDBACK_WORKSHEET: &str = "feedback";

/// Applicant worksheet columns, in sheet order
pub const APPLICANT_COLUMNS: [&str; 12] = [
    "DATE",
    "DATE SUBMITTED",
    "NAME",
    "CONTACT NUMBER",
    "DESIRED POSITION",
    "FORWARDED FROM",
    "ADDRESS",
    "EDUCATIONAL ATTAINMENT",
    "CSC ELIGIBILITY",
    "AGE",
    "GENDER",
    "CURRENT POSITION",
];

/// Feedback worksheet columns, in sheet order
pub const FEEDBACK_COLUMNS: [&str; 4] = ["User", "Title", "Description", "Date Submitted"];

/// Text appended below the date of an online submission
pub const ONLINE_MARKER: &str = "\n(ONLINE)";

/// Date layout used in every date cell
pub const SHEET_DATE_FORMAT: &str = "%m/%d/%Y";

pub const DEFAULT_DESIRED_POSITION: &str = "ANY VACANT POSITION";
pub const DEFAULT_FORWARDED_FROM: &str = "CHRMO";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "MALE" => Some(Gender::Male),
            "FEMALE" => Some(Gender::Female),
            "OTHER" => Some(Gender::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
            Gender::Other => "OTHER",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One applicant intake, as stored in the `Applicants` worksheet.
///
/// Every field is the cell text exactly as stored, so a record read with
/// [`ApplicantRecord::from_row`] writes back the same row. Typed views of the
/// free-form cells are available through [`ApplicantRecord::age`] and
/// [`ApplicantRecord::gender`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    /// `MM/DD/YYYY`, followed by [`ONLINE_MARKER`] for online submissions
    pub date: String,
    pub date_submitted: String,
    pub name: String,
    pub contact_number: String,
    pub desired_position: String,
    pub forwarded_from: String,
    pub address: String,
    pub educational_attainment: String,
    pub csc_eligibility: String,
    /// Whole years, or whatever was typed into the sheet by hand
    pub age: String,
    /// `MALE`, `FEMALE`, `OTHER`, or whatever was typed into the sheet by hand
    pub gender: String,
    pub current_position: String,
}

impl ApplicantRecord {
    /// Cells in [`APPLICANT_COLUMNS`] order
    ///
    /// # Returns
    /// One cell per column. Nothing is reformatted, so
    /// `ApplicantRecord::from_row(&row).to_row() == row` for any full-width
    /// row.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.date.clone(),
            self.date_submitted.clone(),
            self.name.clone(),
            self.contact_number.clone(),
            self.desired_position.clone(),
            self.forwarded_from.clone(),
            self.address.clone(),
            self.educational_attainment.clone(),
            self.csc_eligibility.clone(),
            self.age.clone(),
            self.gender.clone(),
            self.current_position.clone(),
        ]
    }

    /// Rebuild a record from cells in [`APPLICANT_COLUMNS`] order.
    ///
    /// # Arguments
    /// * `row` - Cells of one worksheet row; short rows are padded with empty
    ///   cells and extra cells are ignored
    ///
    /// # Examples
    /// ```
    /// use ams::record::ApplicantRecord;
    ///
    /// let mut row = vec![String::new(); 12];
    /// row[2] = "ANA LIM".to_string();
    /// row[9] = "N/A".to_string();
    /// let record = ApplicantRecord::from_row(&row);
    /// assert_eq!(record.age(), None);
    /// assert_eq!(record.to_row(), row);
    /// ```
    pub fn from_row(row: &[String]) -> Self {
        let cell = |i: usize| row.get(i).cloned().unwrap_or_default();
        ApplicantRecord {
            date: cell(0),
            date_submitted: cell(1),
            name: cell(2),
            contact_number: cell(3),
            desired_position: cell(4),
            forwarded_from: cell(5),
            address: cell(6),
            educational_attainment: cell(7),
            csc_eligibility: cell(8),
            age: cell(9),
            gender: cell(10),
            current_position: cell(11),
        }
    }

    /// Age as a number; `None` when the cell is blank or not a whole number
    pub fn age(&self) -> Option<i32> {
        parse_stored_age(&self.age)
    }

    pub fn gender(&self) -> Option<Gender> {
        Gender::parse(&self.gender)
    }

    pub fn is_online(&self) -> bool {
        self.date.contains("ONLINE")
    }

    /// The row as shown to users: contact number without commas
    pub fn display_row(&self) -> Vec<String> {
        let mut row = self.to_row();
        row[3] = display_contact_number(&self.contact_number);
        row
    }
}

/// Sheets hand numbers back as text, sometimes with thousands separators
pub fn display_contact_number(contact: &str) -> String {
    contact.replace(',', "")
}

fn parse_stored_age(cell: &str) -> Option<i32> {
    let cell = cell.trim();
    if let Ok(age) = cell.parse::<i32>() {
        return Some(age);
    }
    // Spreadsheet exports turn integer columns with gaps into floats
    match cell.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f.is_finite() => Some(f as i32),
        _ => None,
    }
}

/// Parse a birthdate written as `M/D/YYYY` (1-2 digit month and day).
///
/// Only the start of the input has to match. Returns `None` for strings of
/// another shape and for impossible dates such as `02/30/2000`.
pub fn parse_birthdate(input: &str) -> Option<NaiveDate> {
    let caps = BIRTHDATE_REGEX.captures(input)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Whole years between `birthday` and `today`
pub fn age_on(birthday: NaiveDate, today: NaiveDate) -> i32 {
    let before_birthday = (today.month(), today.day()) < (birthday.month(), birthday.day());
    today.year() - birthday.year() - i32::from(before_birthday)
}

/// Interpret the "date of birth or age" field.
///
/// A birthdate yields the age as of `today`; otherwise the field is read as an
/// age directly. Anything else is null.
///
/// # Arguments
/// * `input` - Raw field text, `M/D/YYYY` or a whole number
/// * `today` - Reference day for birthdates
///
/// # Examples
/// ```
/// use ams::record::age_from_birthdate_or_age;
/// use chrono::NaiveDate;
///
/// let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
/// assert_eq!(age_from_birthdate_or_age("6/15/2000", today), Some(23));
/// assert_eq!(age_from_birthdate_or_age("41", today), Some(41));
/// assert_eq!(age_from_birthdate_or_age("forty", today), None);
/// ```
pub fn age_from_birthdate_or_age(input: &str, today: NaiveDate) -> Option<i32> {
    match parse_birthdate(input) {
        Some(birthday) => Some(age_on(birthday, today)),
        None => input.trim().parse::<i32>().ok(),
    }
}

/// Parse a date coming from a form: browser `YYYY-MM-DD` or sheet `MM/DD/YYYY`
pub fn parse_form_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(input, SHEET_DATE_FORMAT))
        .ok()
}

pub fn format_sheet_date(date: NaiveDate) -> String {
    date.format(SHEET_DATE_FORMAT).to_string()
}

/// Raw values posted by the new-applicant form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApplicantForm {
    pub date: String,
    pub date_submitted: String,
    pub name: String,
    pub contact_number: String,
    pub desired_position: String,
    pub forwarded_from: String,
    pub address: String,
    pub educational_attainment: String,
    pub csc_eligibility: String,
    pub birthday_or_age: String,
    pub gender: String,
    pub current_position: String,
    /// Present (any value) when the "Online Submission" box is ticked
    pub online: Option<String>,
}

impl ApplicantForm {
    /// Normalize the form into a storable record
    ///
    /// Dates become `MM/DD/YYYY` (the online marker is appended when the box
    /// was ticked), blank position and referrer take their defaults, the age
    /// is derived with [`age_from_birthdate_or_age`] and the gender is
    /// upper-cased or left blank.
    ///
    /// # Errors
    /// * `MissingRequired` if the date, date submitted or name is blank
    /// * `InvalidDate` if either date cannot be read
    pub fn into_record(self, today: NaiveDate) -> Result<ApplicantRecord, ValidationError> {
        if self.date.trim().is_empty()
            || self.date_submitted.trim().is_empty()
            || self.name.trim().is_empty()
        {
            return Err(ValidationError::MissingRequired);
        }

        let date = parse_form_date(&self.date)
            .ok_or_else(|| ValidationError::InvalidDate(self.date.clone()))?;
        let date_submitted = parse_form_date(&self.date_submitted)
            .ok_or_else(|| ValidationError::InvalidDate(self.date_submitted.clone()))?;

        let mut date_text = format_sheet_date(date);
        if self.online.is_some() {
            date_text.push_str(ONLINE_MARKER);
        }

        let desired_position = if self.desired_position.trim().is_empty() {
            DEFAULT_DESIRED_POSITION.to_string()
        } else {
            self.desired_position
        };
        let forwarded_from = if self.forwarded_from.trim().is_empty() {
            DEFAULT_FORWARDED_FROM.to_string()
        } else {
            self.forwarded_from
        };

        Ok(ApplicantRecord {
            date: date_text,
            date_submitted: format_sheet_date(date_submitted),
            name: self.name,
            contact_number: self.contact_number,
            desired_position,
            forwarded_from,
            address: self.address,
            educational_attainment: self.educational_attainment,
            csc_eligibility: self.csc_eligibility,
            age: age_from_birthdate_or_age(&self.birthday_or_age, today)
                .map(|a| a.to_string())
                .unwrap_or_default(),
            gender: Gender::parse(&self.gender)
                .map(|g| g.to_string())
                .unwrap_or_default(),
            current_position: self.current_position,
        })
    }
}

/// One message left through the feedback form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub user: String,
    pub title: String,
    pub description: String,
    pub date_submitted: String,
}

impl FeedbackRecord {
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.user.clone(),
            self.title.clone(),
            self.description.clone(),
            self.date_submitted.clone(),
        ]
    }

    pub fn from_row(row: &[String]) -> Self {
        let cell = |i: usize| row.get(i).cloned().unwrap_or_default();
        FeedbackRecord {
            user: cell(0),
            title: cell(1),
            description: cell(2),
            date_submitted: cell(3),
        }
    }

    /// Plaintext body sent to the maintainer
    pub fn notification_body(&self) -> String {
        format!("{}\n\nFrom: {}", self.description, self.user)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeedbackForm {
    pub user: String,
    pub title: String,
    pub description: String,
}

impl FeedbackForm {
    pub fn into_record(self, today: NaiveDate) -> Result<FeedbackRecord, ValidationError> {
        if self.title.trim().is_empty() || self.description.trim().is_empty() {
            return Err(ValidationError::MissingFeedback);
        }
        Ok(FeedbackRecord {
            user: self.user,
            title: self.title,
            description: self.description,
            date_submitted: format_sheet_date(today),
        })
    }
}
