// Demo host: sample mods hooking a damage function
use anyhow::Context;
use clap::Parser;
use modhook_core::ModEventHook;
use modhook_runtime::{
    call_with_hooks, set_dispatcher, with_owner, DispatchConfig, HookDispatcher,
    ScopedOwnerResolver,
};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

mod mods;

use mods::{armor, damage_log, damage_params, last_stand, take_damage, DamageHook, TAKE_DAMAGE};

#[derive(Parser)]
#[command(name = "modhook-demo")]
#[command(about = "Runs sample mods against a hooked damage function")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Load the sample mods and apply a series of hits
    Run {
        /// Dispatch configuration (JSON or TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Starting health
        #[arg(long, default_value_t = 100)]
        health: u32,

        /// Damage per hit
        #[arg(long, default_value_t = 40)]
        amount: i32,

        /// Number of hits
        #[arg(long, default_value_t = 4)]
        hits: u32,
    },
    /// Write the default dispatch configuration
    InitConfig {
        /// Output path
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            health,
            amount,
            hits,
        } => {
            let config = match config {
                Some(path) => DispatchConfig::load_or_default(&path)?,
                None => DispatchConfig::default(),
            };
            run(config, health, amount, hits)?;
        }
        Commands::InitConfig { output } => {
            DispatchConfig::default()
                .save(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Wrote default dispatch config to {}", output.display());
        }
    }

    Ok(())
}

fn run(config: DispatchConfig, mut health: u32, amount: i32, hits: u32) -> anyhow::Result<()> {
    let resolver = Arc::new(ScopedOwnerResolver::from_config(&config));
    let dispatcher = Arc::new(HookDispatcher::new(config));
    let hook: Arc<DamageHook> = dispatcher
        .registry()
        .register(TAKE_DAMAGE, ModEventHook::shared(resolver))?;
    set_dispatcher(Arc::clone(&dispatcher));

    let armor_listener = with_owner(armor::NAME, || armor::init(&hook));
    let logged_hits = with_owner(damage_log::NAME, || damage_log::init(&hook));
    with_owner(last_stand::NAME, || last_stand::init(&hook));

    // A mod cannot unhook another mod's listener.
    let removed = with_owner(damage_log::NAME, || {
        hook.before().remove_listener(&armor_listener)
    });
    println!(
        "{} removing {}'s listener: {}",
        damage_log::NAME,
        armor::NAME,
        if removed { "removed" } else { "refused" }
    );

    for hit in 1..=hits {
        if hit == hits {
            with_owner(armor::NAME, || hook.before().remove_listener(&armor_listener));
            println!("{} unloaded", armor::NAME);
        }
        health = call_with_hooks(TAKE_DAMAGE, damage_params(health, amount), take_damage)?;
        println!("Hit {}: health {}", hit, health);
    }

    println!(
        "{} saw {} hit(s)",
        damage_log::NAME,
        logged_hits.load(Ordering::SeqCst)
    );
    Ok(())
}
