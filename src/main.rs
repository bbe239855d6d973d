use std::{fs, path::Path};
use clap::Parser;
use anyhow::{bail, Result};
use env_logger::Env;

use zk_groupsig::commands::{load_params, read_message};
use zk_groupsig::types::ProofMode;
use zk_groupsig::utils::parsing::parse_nonce;

/// Command-line arguments for the group signature prover and verifier
#[derive(Parser)]
#[command(name = "zk-groupsig")]
#[command(about = "Anonymous RSA group signatures with plonky2")]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(short, long, global = true, default_value = "build", help = "Output directory for artifacts")]
    output_dir: String,

    #[arg(long, global = true, help = "Circuit parameters JSON file")]
    params: Option<String>,

    #[arg(long, global = true, help = "Override the RSA modulus size in bits")]
    key_bits: Option<usize>,

    #[arg(long, global = true, help = "Override the maximum group size")]
    max_group_size: Option<usize>,
}

#[derive(Parser)]
enum Commands {
    /// Compile the circuits and export verifier keys
    Setup {
        #[arg(long, default_value = "both", help = "Circuit mode: plain, nullifier or both")]
        mode: String,
    },
    /// Check a public key list and membership key before proving
    CheckKeys {
        #[arg(long, help = "File with one ssh-rsa public key per line")]
        public_keys: String,
        #[arg(long, help = "Armored SSHSIG membership key")]
        membership_key: String,
    },
    /// Sign a message on behalf of the group
    Prove {
        #[arg(long, help = "File with one ssh-rsa public key per line")]
        public_keys: String,
        #[arg(long, help = "Armored SSHSIG membership key")]
        membership_key: String,
        #[arg(long, help = "Message text")]
        message: Option<String>,
        #[arg(long, help = "File holding the message bytes")]
        message_file: Option<String>,
        #[arg(long, help = "32-byte nonce as hex; enables the nullifier")]
        nonce_hex: Option<String>,
        #[arg(long, help = "Context string hashed into the nonce; enables the nullifier")]
        nonce_context: Option<String>,
        #[arg(long, default_value = "group_signature.txt", help = "Output file name")]
        output: String,
    },
    /// Verify a group signature and print the recovered key set
    Verify {
        #[arg(long, help = "Armored group signature")]
        proof: String,
        #[arg(long, help = "Message text")]
        message: Option<String>,
        #[arg(long, help = "File holding the message bytes")]
        message_file: Option<String>,
        #[arg(long, help = "Exported verifier key; skips circuit compilation")]
        verifier_key: Option<String>,
    },
}

fn parse_modes(mode: &str) -> Result<Vec<ProofMode>> {
    match mode {
        "plain" => Ok(vec![ProofMode::Plain]),
        "nullifier" => Ok(vec![ProofMode::Nullifier]),
        "both" => Ok(ProofMode::ALL.to_vec()),
        _ => bail!("Invalid mode: {}. Use 'plain', 'nullifier' or 'both'", mode),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    use std::time::Instant;

    let build_dir = Path::new(&args.output_dir);
    if !build_dir.exists() {
        fs::create_dir_all(build_dir)?;
    }
    let params = load_params(args.params.as_deref(), args.key_bits, args.max_group_size)?;

    let total_start = Instant::now();
    let ok = match args.command {
        Some(Commands::Setup { mode }) => {
            println!("=== GROUP SIGNATURE SETUP ===");
            use zk_groupsig::commands::setup::run_setup;
            run_setup(params, &parse_modes(&mode)?, build_dir)?;
            println!("Artifacts saved to: {}", build_dir.display());
            true
        }
        Some(Commands::CheckKeys { public_keys, membership_key }) => {
            use zk_groupsig::commands::check_keys::run_check_keys;
            run_check_keys(&params, &public_keys, &membership_key)?
        }
        Some(Commands::Prove {
            public_keys,
            membership_key,
            message,
            message_file,
            nonce_hex,
            nonce_context,
            output,
        }) => {
            println!("=== GENERATING GROUP SIGNATURE ===");
            use zk_groupsig::commands::prove::{generate_group_signature, ProveArgs};
            let output = build_dir.join(output);
            generate_group_signature(
                params,
                ProveArgs {
                    public_keys_file: &public_keys,
                    membership_key_file: &membership_key,
                    message: read_message(message.as_deref(), message_file.as_deref())?,
                    nonce: parse_nonce(nonce_hex.as_deref(), nonce_context.as_deref())?,
                    output: &output,
                },
            )?;
            true
        }
        Some(Commands::Verify { proof, message, message_file, verifier_key }) => {
            use zk_groupsig::commands::verify::run_verify;
            let message = read_message(message.as_deref(), message_file.as_deref())?;
            run_verify(params, &message, &proof, verifier_key.as_deref())?
        }
        None => {
            println!("No command specified. Available commands:");
            println!("  zk-groupsig setup --key-bits 4096 --max-group-size 16");
            println!("  zk-groupsig check-keys --public-keys keys.txt --membership-key member.sig");
            println!("  zk-groupsig prove --public-keys keys.txt --membership-key member.sig --message 'hello'");
            println!("  zk-groupsig prove --public-keys keys.txt --membership-key member.sig --message 'vote' --nonce-context item-42");
            println!("  zk-groupsig verify --proof build/group_signature.txt --message 'hello'");
            true
        }
    };

    log::info!("total execution time: {:?}", total_start.elapsed());
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
