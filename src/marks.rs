use log::{info, warn};
use serde::{
    Deserialize, Serialize, Serializer,
    ser::{SerializeMap, SerializeSeq},
};
use serde_json::Value;

use crate::{
    cookies::SessionCookieJar,
    errors::{ExtractError, ScrapeError},
    scraping_context::ScrapingContext,
    text_manipulators::json_scalar_to_string,
};

#[derive(Debug, Deserialize)]
struct MarksPayload {
    subjects: Vec<SubjectPayload>,
}

#[derive(Debug, Deserialize)]
struct SubjectPayload {
    name: String,
    #[serde(default)]
    works: Vec<WorkPayload>,
    #[serde(default)]
    average: Option<ValuePayload>,
}

#[derive(Debug, Deserialize)]
struct WorkPayload {
    #[serde(default)]
    marks: Vec<ValuePayload>,
}

#[derive(Debug, Deserialize)]
struct ValuePayload {
    value: Value,
}

/// One subject's grades, serialized as `[grades]` or `[grades, average]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectMarks {
    grades: Vec<String>,
    average: Option<String>,
}

impl SubjectMarks {
    /// The average is kept iff there is at least one grade, and is then required.
    pub fn new(grades: Vec<String>, average: Option<String>) -> Result<Self, ExtractError> {
        if grades.is_empty() {
            return Ok(Self {
                grades,
                average: None,
            });
        }
        let average = average.ok_or(ExtractError::MissingField("average"))?;
        Ok(Self {
            grades,
            average: Some(average),
        })
    }

    pub fn grades(&self) -> &[String] {
        &self.grades
    }

    pub fn average(&self) -> Option<&str> {
        self.average.as_deref()
    }
}

impl Serialize for SubjectMarks {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.average.is_some() { 2 } else { 1 };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.grades)?;
        if let Some(average) = &self.average {
            seq.serialize_element(average)?;
        }
        seq.end()
    }
}

/// Subject name -> marks, in the order the portal listed the subjects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarksResult {
    subjects: Vec<(String, SubjectMarks)>,
}

impl MarksResult {
    /// A repeated subject keeps its first position and takes the new marks.
    pub fn insert(&mut self, subject: String, marks: SubjectMarks) {
        match self.subjects.iter_mut().find(|(name, _)| *name == subject) {
            Some((_, existing)) => *existing = marks,
            None => self.subjects.push((subject, marks)),
        }
    }

    pub fn get(&self, subject: &str) -> Option<&SubjectMarks> {
        self.subjects
            .iter()
            .find(|(name, _)| name == subject)
            .map(|(_, marks)| marks)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SubjectMarks)> {
        self.subjects.iter().map(|(name, marks)| (name.as_str(), marks))
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

impl Serialize for MarksResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.subjects.len()))?;
        for (name, marks) in &self.subjects {
            map.serialize_entry(name, marks)?;
        }
        map.end()
    }
}

fn scalar(value: &Value, field: &'static str) -> Result<String, ExtractError> {
    json_scalar_to_string(value).ok_or(ExtractError::MissingField(field))
}

fn reshape_marks(payload: MarksPayload) -> Result<MarksResult, ExtractError> {
    let mut result = MarksResult::default();
    for subject in payload.subjects {
        let mut grades = vec![];
        for work in &subject.works {
            for mark in &work.marks {
                grades.push(scalar(&mark.value, "marks.value")?);
            }
        }
        let average = match &subject.average {
            Some(average) if !grades.is_empty() => Some(scalar(&average.value, "average.value")?),
            _ => None,
        };
        result.insert(subject.name, SubjectMarks::new(grades, average)?);
    }
    Ok(result)
}

/// Parses the raw marks api body into the compact per-subject form.
pub fn parse_marks(body: &str) -> Result<MarksResult, ExtractError> {
    let payload: MarksPayload = serde_json::from_str(body)?;
    reshape_marks(payload)
}

pub async fn fetch_marks(
    ctx: &ScrapingContext,
    school_id: &str,
    person_id: &str,
    cookies: &SessionCookieJar,
) -> Result<MarksResult, ScrapeError> {
    let url = ctx
        .scraping_config
        .get_marks_url(school_id, person_id)
        .map_err(|e| ScrapeError::MalformedSession(e.to_string()))?;
    let body = ctx
        .request_client
        .fetch_url_body(&url, cookies)
        .await
        .inspect_err(|e| warn!(target: ctx.log_target(), "marks request failed ({}): {e}", e.kind()))?;

    let marks = parse_marks(&body).map_err(|e| {
        warn!(target: ctx.log_target(), "marks payload has unexpected shape: {e}");
        ScrapeError::from(e)
    })?;
    info!(target: ctx.log_target(), "fetched marks for {} subjects", marks.len());
    Ok(marks)
}
