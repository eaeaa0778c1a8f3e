use std::fmt;

use ledger::sqlite::SqliteLedger;
use study_core::model::{Question, QuestionId, Section, Subject};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    subject: String,
    sections: u32,
    questions_per_section: u32,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidSections { raw: String },
    InvalidQuestions { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSections { raw } => write!(f, "invalid --sections value: {raw}"),
            ArgsError::InvalidQuestions { raw } => write!(f, "invalid --questions value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("STUDY_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut subject = "english".to_string();
        let mut sections = 3_u32;
        let mut questions_per_section = 15_u32;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => db_url = require_value(&mut args, "--db")?,
                "--subject" => subject = require_value(&mut args, "--subject")?,
                "--sections" => {
                    let raw = require_value(&mut args, "--sections")?;
                    sections = raw
                        .parse()
                        .map_err(|_| ArgsError::InvalidSections { raw })?;
                }
                "--questions" => {
                    let raw = require_value(&mut args, "--questions")?;
                    questions_per_section = raw
                        .parse()
                        .map_err(|_| ArgsError::InvalidQuestions { raw })?;
                }
                other => return Err(ArgsError::UnknownArg(other.to_string())),
            }
        }

        Ok(Self {
            db_url,
            subject,
            sections,
            questions_per_section,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse()?;

    let repo = SqliteLedger::connect(&args.db_url).await?;
    repo.migrate().await?;

    let subject = Subject::new(&args.subject)?;

    let mut next_question_id = 1_u64;
    for section_number in 1..=args.sections {
        let section = Section::new(subject.clone(), section_number, args.questions_per_section)?;
        repo.insert_section(&section).await?;

        for i in 1..=args.questions_per_section {
            let question = Question::new(
                QuestionId::new(next_question_id),
                subject.clone(),
                section_number,
                format!("Sample question {i} for {subject} section {section_number}"),
                vec![
                    "option a".into(),
                    "option b".into(),
                    "option c".into(),
                    "option d".into(),
                ],
                (i as usize - 1) % 4,
            )?;
            repo.insert_question(&question).await?;
            next_question_id += 1;
        }
    }

    println!(
        "seeded {} sections x {} questions for subject '{}' into {}",
        args.sections, args.questions_per_section, args.subject, args.db_url
    );
    Ok(())
}
