#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{NaiveDate, Utc};
use clap::{Arg, ArgMatches, Command};
use fitcoach_client::auth::Registration;
use fitcoach_client::config::ClientOptions;
use fitcoach_client::error::{Error, Result};
use fitcoach_client::plans::{bucket_by_day, DayKey, Scheduled};
use fitcoach_client::routes::{can_enter, Decision, Route};
use fitcoach_client::FitCoach;
use tracing_subscriber::EnvFilter;

fn cli() -> Command<'static> {
    let day = Arg::new("day")
        .long("day")
        .value_name("YYYY-MM-DD")
        .takes_value(true)
        .help("Only show plans scheduled on this UTC day (\"today\" allowed)");

    Command::new("fitcoach")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Command-line client for the FitCoach API")
        .subcommand_required(true)
        .subcommand(
            Command::new("login")
                .about("Sign in and remember the session")
                .arg(Arg::new("email").required(true))
                .arg(Arg::new("password").required(true)),
        )
        .subcommand(
            Command::new("register")
                .about("Create an account and sign in")
                .arg(Arg::new("email").required(true))
                .arg(Arg::new("password").required(true))
                .arg(Arg::new("full_name").required(true))
                .arg(
                    Arg::new("admin_code")
                        .long("admin-code")
                        .takes_value(true)
                        .help("Trainer code; the server decides whether it grants admin rights"),
                ),
        )
        .subcommand(Command::new("logout").about("Forget the stored session"))
        .subcommand(Command::new("whoami").about("Show the signed-in user"))
        .subcommand(Command::new("workouts").about("List your workout plans").arg(day.clone()))
        .subcommand(Command::new("meals").about("List your meal plans").arg(day))
}

fn parse_day(matches: &ArgMatches) -> Result<Option<DayKey>> {
    match matches.value_of("day") {
        None => Ok(None),
        Some("today") => Ok(Some(DayKey::of(&Utc::now()))),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(|d| Some(DayKey::from(d)))
            .map_err(|_| Error::invalid_input(format!("invalid day: {}", raw))),
    }
}

fn require(client: &FitCoach, route: Route) -> Result<()> {
    match can_enter(route.requirement(), &client.session_state()) {
        Decision::Allow => Ok(()),
        Decision::RedirectTo(Route::Login) => {
            Err(Error::invalid_input("not signed in; run `fitcoach login` first"))
        }
        Decision::RedirectTo(other) => Err(Error::invalid_input(format!(
            "not available here; try {}",
            other
        ))),
    }
}

fn print_plans<P: Scheduled + Clone>(plans: &[P], day: Option<DayKey>, title: impl Fn(&P) -> String) {
    let buckets = bucket_by_day(plans);
    let mut printed = false;
    for (key, plans) in &buckets {
        if day.map_or(false, |d| d != *key) {
            continue;
        }
        println!("{}", key);
        for plan in plans {
            println!("  {}", title(plan));
        }
        printed = true;
    }
    if !printed {
        println!("No plans scheduled.");
    }
}

async fn run(matches: ArgMatches) -> Result<()> {
    let (url, mut options) = ClientOptions::from_env()?;
    if options.storage_dir.is_none() {
        let home = std::env::var_os("HOME")
            .ok_or_else(|| Error::invalid_input("set FITCOACH_STORAGE_DIR or HOME"))?;
        options.storage_dir = Some(PathBuf::from(home).join(".fitcoach"));
    }
    let client = FitCoach::new_with_options(url.as_str(), options)?;

    match matches.subcommand() {
        Some(("login", args)) => {
            let email = args.value_of("email").unwrap_or_default();
            let password = args.value_of("password").unwrap_or_default();
            let profile = client.auth().login(email, password).await?;
            println!("Signed in as {} <{}>", profile.full_name, profile.email);
        }
        Some(("register", args)) => {
            let mut registration = Registration::new(
                args.value_of("email").unwrap_or_default(),
                args.value_of("password").unwrap_or_default(),
                args.value_of("full_name").unwrap_or_default(),
            );
            if let Some(code) = args.value_of("admin_code") {
                registration = registration.with_admin_code(code);
            }
            let profile = client.auth().register(registration).await?;
            let role = if profile.is_admin { "trainer" } else { "athlete" };
            println!("Registered {} as {}", profile.email, role);
        }
        Some(("logout", _)) => {
            client.auth().logout();
            println!("Signed out");
        }
        Some(("whoami", _)) => match client.auth().restore().await {
            Some(profile) => println!(
                "{} <{}>{}",
                profile.full_name,
                profile.email,
                if profile.is_admin { " (trainer)" } else { "" }
            ),
            None => println!("Not signed in"),
        },
        Some(("workouts", args)) => {
            client.auth().restore().await;
            require(&client, Route::WorkoutPlan)?;
            let plans = client.workouts().list_for_user().await?;
            print_plans(&plans, parse_day(args)?, |p| p.title.clone());
        }
        Some(("meals", args)) => {
            client.auth().restore().await;
            require(&client, Route::MealPlan)?;
            let plans = client.meals().list_for_user().await?;
            print_plans(&plans, parse_day(args)?, |p| p.title.clone());
        }
        _ => return Err(Error::invalid_input("unknown command")),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli().get_matches()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.user_message());
            tracing::debug!(error = %err, "command failed");
            ExitCode::FAILURE
        }
    }
}
