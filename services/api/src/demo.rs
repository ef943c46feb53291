use crate::infra::{build_portal, LoggingTransport};
use chrono::Utc;
use clap::Args;
use ration_card::cards::{ApplicationDetails, CardUpdate};
use ration_card::config::{CardNumberScheme, DistributionConfig, RegistryConfig};
use ration_card::error::AppError;
use ration_card::tokens::DistributionRequest;
use ration_card::users::{InMemoryUserDirectory, User, UserId};
use ration_card::{Principal, Role};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Issue zero-padded sequential card numbers instead of random ones
    #[arg(long)]
    pub(crate) sequential: bool,
    /// Notification text sent with the collection slot
    #[arg(long, default_value = "Collect ration")]
    pub(crate) message: String,
    /// Collection slot announced to recipients
    #[arg(long, default_value = "10-12")]
    pub(crate) time_slot: String,
}

fn resident(id: &str, name: &str, phone: &str, role: Role) -> User {
    User {
        id: UserId::new(id),
        name: name.to_string(),
        email: format!("{id}@example.org"),
        phone: phone.to_string(),
        role,
        created_at: Utc::now(),
    }
}

fn application(name: &str, aadhaar: &str) -> ApplicationDetails {
    ApplicationDetails {
        name: name.to_string(),
        address: "12 Market Road, Ward 4".to_string(),
        family_members: 3,
        aadhaar: aadhaar.to_string(),
        income_proof: format!("uploads/{}-income.pdf", name.to_lowercase()),
        photo: format!("uploads/{}-photo.jpg", name.to_lowercase()),
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let registry = RegistryConfig {
        card_numbers: if args.sequential {
            CardNumberScheme::Sequential
        } else {
            CardNumberScheme::Random
        },
        ..RegistryConfig::default()
    };

    let users = Arc::new(InMemoryUserDirectory::with_users([
        resident("u1", "Asha", "+919000000001", Role::User),
        resident("u2", "Ravi", "", Role::User),
        resident("officer", "Block Officer", "+919000000099", Role::Admin),
    ]));
    let portal = build_portal(
        &registry,
        DistributionConfig::default(),
        users,
        Arc::new(LoggingTransport),
    );

    let asha = portal.citizen(&Principal::citizen("u1"));
    let ravi = portal.citizen(&Principal::citizen("u2"));
    let Ok(officer) = portal.admin(&Principal::admin("officer")) else {
        println!("Admin surface unavailable");
        return Ok(());
    };

    println!("Ration card portal demo");
    println!("\nApplication intake");

    let submission = match asha
        .submit_application(application("Asha", "123456789012"))
        .await
    {
        Ok(submission) => submission,
        Err(err) => {
            println!("  Submission rejected: {}", err);
            return Ok(());
        }
    };
    println!(
        "  Asha applied: card {} is {} ({})",
        submission.card.id,
        submission.card.status(),
        submission.screening.details
    );

    match ravi
        .submit_application(application("Ravi", "000000000000"))
        .await
    {
        Ok(flagged) => println!(
            "  Ravi applied: card {} is {} ({})",
            flagged.card.id,
            flagged.card.status(),
            flagged.screening.details
        ),
        Err(err) => println!("  Ravi's submission rejected: {}", err),
    }

    match asha
        .submit_application(application("Asha", "123456789012"))
        .await
    {
        Ok(_) => println!("  Duplicate application unexpectedly accepted"),
        Err(err) => println!("  Second application from Asha refused: {}", err),
    }

    println!("\nAdministrative review");
    match officer.approve(&submission.card.id) {
        Ok(number) => println!("  Approved {} with number {}", submission.card.id, number),
        Err(err) => println!("  Approval failed: {}", err),
    }
    match officer.approve(&submission.card.id) {
        Ok(number) => println!("  Second approval unexpectedly issued {}", number),
        Err(err) => println!("  Second approval refused: {}", err),
    }

    match asha.update_card(CardUpdate {
        address: Some("7 Temple Street, Ward 2".to_string()),
        ..CardUpdate::default()
    }) {
        Ok(card) => println!(
            "  Asha moved to '{}'; card stays {} with number {}",
            card.address,
            card.status(),
            card.card_number()
                .map(ToString::to_string)
                .unwrap_or_else(|| "none".to_string())
        ),
        Err(err) => println!("  Update failed: {}", err),
    }

    match officer.list_cards() {
        Ok(cards) => {
            println!("  Cards on file:");
            for card in cards {
                println!("    {} {:<8} {}", card.id, card.status().label(), card.name);
            }
        }
        Err(err) => println!("  Card listing unavailable: {}", err),
    }

    println!("\nToken distribution");
    let recipients = match officer.list_users() {
        Ok(users) => users.into_iter().map(|user| user.id).collect::<Vec<_>>(),
        Err(err) => {
            println!("  User directory unavailable: {}", err);
            return Ok(());
        }
    };

    match officer
        .distribute_tokens(DistributionRequest {
            user_ids: recipients,
            message: args.message,
            time_slot: args.time_slot,
        })
        .await
    {
        Ok(summary) => {
            println!(
                "  Batch {}: attempted {}, succeeded {}, failed {}",
                summary.batch_id, summary.attempted, summary.succeeded, summary.failed
            );
            for failure in &summary.failures {
                println!("    {}: {}", failure.user_id, failure.error);
            }
        }
        Err(err) => println!("  Distribution rejected: {}", err),
    }

    match officer.deliveries() {
        Ok(records) => println!("  Delivery ledger holds {} records", records.len()),
        Err(err) => println!("  Delivery ledger unavailable: {}", err),
    }

    Ok(())
}
