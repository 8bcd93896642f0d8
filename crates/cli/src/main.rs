use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use triage_core::{
    config::{flow_variant_from_env_value, load_fixtures_source},
    constants::DEFAULT_HIGH_RISK_AGE,
    intake::{assess_age, parse_birthdate},
    questions::QuestionGenerator,
    DashboardFilter, FixtureBook, FlowDefinition, ReferenceCode,
};

#[derive(Parser)]
#[command(name = "triage")]
#[command(about = "Emergency triage intake and dashboard CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the follow-up questions generated for a symptom description
    Questions {
        /// Free-text symptoms, e.g. "dolor en el pecho"
        symptoms: String,
    },
    /// Compute age and high-risk flag for a birthdate
    Age {
        /// Birthdate (YYYY-MM-DD)
        birthdate: String,
        /// Reference date (YYYY-MM-DD, default today)
        #[arg(long)]
        today: Option<String>,
        /// Age from which the patient counts as high risk
        #[arg(long, default_value_t = DEFAULT_HIGH_RISK_AGE)]
        high_risk_age: u32,
    },
    /// Generate a patient reference code
    Reference,
    /// List the steps of a wizard flow
    Flow {
        /// role-screen or login-gate
        #[arg(long)]
        variant: Option<String>,
    },
    /// Show the triage table
    Dashboard {
        /// ESI level 1-5 or "all"
        #[arg(long)]
        esi: Option<String>,
        /// waiting, in-progress, completed or "all"
        #[arg(long)]
        status: Option<String>,
        /// none, esi, name or arrival
        #[arg(long)]
        sort: Option<String>,
        /// Fixture file to use instead of the demo patients
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },
    /// Show the history panel for a patient
    History {
        /// Reference code, e.g. PRE-12345
        reference: String,
        /// Fixture file to use instead of the demo patients
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },
}

fn load_book(fixtures: Option<PathBuf>) -> Result<FixtureBook, Box<dyn std::error::Error>> {
    let yaml = load_fixtures_source(fixtures)?;
    Ok(FixtureBook::parse(&yaml)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Questions { symptoms }) => {
            let generator = QuestionGenerator::standard();
            let groups = generator.matched_groups(&symptoms);
            if groups.is_empty() {
                println!("No keyword group matched; using general questions.");
            } else {
                println!("Matched: {}", groups.join(", "));
            }
            for question in generator.generate(&symptoms) {
                println!("[{}] {}", question.id, question.prompt);
                for option in question.options.iter().filter(|o| !o.value.is_empty()) {
                    println!("    - {} ({})", option.label, option.value);
                }
            }
        }
        Some(Commands::Age {
            birthdate,
            today,
            high_risk_age,
        }) => {
            let today = match today {
                Some(t) => parse_birthdate(&t)?,
                None => Local::now().date_naive(),
            };
            match parse_birthdate(&birthdate) {
                Ok(b) if b > today => eprintln!("Birthdate {} is in the future", birthdate),
                Ok(b) => {
                    let assessment = assess_age(b, today, high_risk_age);
                    println!("Age: {} años", assessment.age);
                    if assessment.high_risk {
                        println!("High-risk patient (age >= {})", high_risk_age);
                    }
                }
                Err(e) => eprintln!("Error: {}", e),
            }
        }
        Some(Commands::Reference) => {
            println!("{}", ReferenceCode::generate(&mut rand::thread_rng()));
        }
        Some(Commands::Flow { variant }) => {
            let flow = FlowDefinition::new(flow_variant_from_env_value(variant)?);
            println!("Flow: {}", flow.variant());
            for (idx, step) in flow.steps().iter().enumerate() {
                println!("{:>2}. {} ({:?})", idx + 1, step.kind.title(), step.entry);
            }
        }
        Some(Commands::Dashboard {
            esi,
            status,
            sort,
            fixtures,
        }) => {
            let book = load_book(fixtures)?;
            let filter =
                DashboardFilter::from_query(esi.as_deref(), status.as_deref(), sort.as_deref())?;
            let rows = book.dashboard().apply(&filter);
            let shown: Vec<_> = rows.iter().filter(|r| r.visible).collect();
            if shown.is_empty() {
                println!("No patients match.");
            }
            for row in shown {
                println!(
                    "{} | ESI {} {:<15} | {:<20} | {:>6} | {} | {:<30} | {}",
                    row.reference,
                    row.esi,
                    row.esi_label,
                    row.name,
                    row.age_sex,
                    row.arrival,
                    row.complaint,
                    row.status_label
                );
            }
        }
        Some(Commands::History {
            reference,
            fixtures,
        }) => {
            let book = load_book(fixtures)?;
            match ReferenceCode::parse(&reference).and_then(|r| book.patient_detail(r)) {
                Ok(detail) => {
                    println!("{} ({}) - {}", detail.name, detail.age_sex, detail.reference);
                    println!("Motivo: {}", detail.complaint);
                    println!("Alergias: {}", detail.history.allergies);
                    println!("Condiciones: {}", detail.history.conditions);
                    println!("Contacto: {}", detail.history.contact);
                    if detail.history.has_alert() {
                        println!("ALERTA: {}", detail.history.alert);
                    }
                    for visit in &detail.history.visits {
                        println!("  {} - {} (ESI {})", visit.date, visit.reason, visit.esi);
                    }
                }
                Err(e) => eprintln!("Error: {}", e),
            }
        }
        None => {
            println!("Use 'triage --help' for commands");
        }
    }

    Ok(())
}
