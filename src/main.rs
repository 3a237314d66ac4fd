use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "stepquest")]
#[command(about = "StepQuest - turn your daily steps into levels, quests and a growing pet")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.stepquest/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Treat the premium subscription as active
    #[arg(long, global = true)]
    premium: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the config file and progress database
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Push an activity snapshot (today's totals so far)
    Feed {
        /// Steps taken today
        steps: i64,

        /// Lifetime step total (defaults to recorded days plus today)
        #[arg(long)]
        lifetime: Option<i64>,

        /// Distance today in meters
        #[arg(long, default_value_t = 0.0)]
        distance: f64,

        /// Active calories today
        #[arg(long, default_value_t = 0.0)]
        calories: f64,

        /// Active minutes today
        #[arg(long, default_value_t = 0)]
        active: i64,

        /// Day the totals belong to (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Show level, streak and pet
    Status {
        /// List every achievement with its progress
        #[arg(long)]
        achievements: bool,
    },

    /// List today's quests
    Quests,

    /// Swap a quest for a different one
    RefreshQuest {
        /// Quest id or slot number (0-2)
        quest: String,
    },

    /// Personal challenges
    Challenge {
        #[command(subcommand)]
        action: ChallengeAction,
    },

    /// Group challenges (premium)
    Group {
        #[command(subcommand)]
        action: GroupAction,
    },

    /// Pets and accessories
    Pet {
        #[command(subcommand)]
        action: PetAction,
    },

    /// Apply --premium as the current subscription status
    PremiumSync,

    /// Erase all progression data
    Wipe {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ChallengeAction {
    /// Start a challenge
    Create {
        /// daily_steps, weekly_steps, weekly_distance, streak_days, daily_calories, active_minutes
        kind: String,

        /// Goal value (defaults to the smallest preset for the kind)
        #[arg(long)]
        target: Option<u64>,

        /// Duration in days
        #[arg(long, default_value_t = 7)]
        days: u32,
    },

    /// Cancel a challenge
    Cancel { id: String },

    /// List challenges
    List {
        /// Include finished challenges and stats
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand)]
enum GroupAction {
    /// Start a group challenge
    Create {
        name: String,
        kind: String,
        target: u64,

        #[arg(long, default_value_t = 7)]
        days: u32,

        /// Participant as id:name[:progress], repeatable
        #[arg(short, long = "participant")]
        participants: Vec<String>,
    },

    /// Replace remote participants' progress
    Sync {
        id: String,

        /// Participant as id:name:progress, repeatable
        #[arg(short, long = "participant")]
        participants: Vec<String>,
    },

    /// Delete a group challenge
    Delete { id: String },

    /// List group challenges with standings
    List,
}

#[derive(Subcommand)]
enum PetAction {
    /// List pets and accessories
    List,

    /// Adopt a pet
    Create {
        name: String,

        /// cat, poodle, rabbit, fox, penguin
        #[arg(long, default_value = "cat")]
        kind: String,
    },

    /// Make a pet the active one
    Select { id: String },

    /// Rename a pet
    Rename { id: String, name: String },

    /// Put an accessory on the active pet
    Equip { accessory: String },

    /// Clear a slot (head, neck, chest) on the active pet
    Unequip { slot: String },

    /// Delete a pet
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let config = cli.config.as_ref();
    let premium = cli.premium;

    match cli.command {
        Some(Commands::Init { force }) => {
            cli::init::init_command(config, force).await?;
        }
        Some(Commands::Feed {
            steps,
            lifetime,
            distance,
            calories,
            active,
            date,
        }) => {
            let args = cli::feed::FeedArgs {
                steps,
                lifetime,
                distance,
                calories,
                active_minutes: active,
                date,
            };
            cli::feed::feed_command(config, premium, args).await?;
        }
        Some(Commands::Status { achievements }) => {
            cli::status::status_command(config, premium, achievements).await?;
        }
        Some(Commands::Quests) => {
            cli::quest::quests_command(config, premium).await?;
        }
        Some(Commands::RefreshQuest { quest }) => {
            cli::quest::refresh_quest_command(config, premium, &quest).await?;
        }
        Some(Commands::Challenge { action }) => match action {
            ChallengeAction::Create { kind, target, days } => {
                cli::challenge::challenge_create_command(config, premium, &kind, target, days).await?;
            }
            ChallengeAction::Cancel { id } => {
                cli::challenge::challenge_cancel_command(config, premium, &id).await?;
            }
            ChallengeAction::List { all } => {
                cli::challenge::challenge_list_command(config, premium, all).await?;
            }
        },
        Some(Commands::Group { action }) => match action {
            GroupAction::Create {
                name,
                kind,
                target,
                days,
                participants,
            } => {
                cli::group::group_create_command(config, premium, &name, &kind, target, days, &participants)
                    .await?;
            }
            GroupAction::Sync { id, participants } => {
                cli::group::group_sync_command(config, premium, &id, &participants).await?;
            }
            GroupAction::Delete { id } => {
                cli::group::group_delete_command(config, premium, &id).await?;
            }
            GroupAction::List => {
                cli::group::group_list_command(config, premium).await?;
            }
        },
        Some(Commands::Pet { action }) => match action {
            PetAction::List => cli::pet::pet_list_command(config, premium).await?,
            PetAction::Create { name, kind } => {
                cli::pet::pet_create_command(config, premium, &name, &kind).await?;
            }
            PetAction::Select { id } => cli::pet::pet_select_command(config, premium, &id).await?,
            PetAction::Rename { id, name } => {
                cli::pet::pet_rename_command(config, premium, &id, &name).await?;
            }
            PetAction::Equip { accessory } => {
                cli::pet::pet_equip_command(config, premium, &accessory).await?;
            }
            PetAction::Unequip { slot } => {
                cli::pet::pet_unequip_command(config, premium, &slot).await?;
            }
            PetAction::Delete { id } => cli::pet::pet_delete_command(config, premium, &id).await?,
        },
        Some(Commands::PremiumSync) => {
            cli::premium::premium_sync_command(config, premium).await?;
        }
        Some(Commands::Wipe { yes }) => {
            cli::wipe::wipe_command(config, yes).await?;
        }
        None => {
            // Default: show status
            cli::status::status_command(config, premium, false).await?;
        }
    }

    Ok(())
}
