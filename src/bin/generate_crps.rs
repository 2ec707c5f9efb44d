use clap::{Parser, ValueEnum};
use ndarray::{Array1, Array3, ArrayView1, Axis};
use puf_sim::{
    ArbiterPuf, BentArbiterPuf, BentConfig, ChallengeStrategy, Puf, PufConfig, XorArbiterPuf,
    XorConfig,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
enum Kind {
    Arbiter,
    Xor,
    Bent,
}

#[derive(Parser, Debug)]
#[command(name = "generate_crps")]
#[command(about = "Simulate an arbiter PUF and print challenge-response pairs")]
struct Args {
    #[arg(long, value_enum, default_value = "arbiter", help = "PUF construction")]
    kind: Kind,

    #[arg(long, default_value = "64", help = "Number of stages")]
    bits: usize,

    #[arg(long, default_value = "4", help = "Number of arbiter chains (xor / bent)")]
    branches: usize,

    #[arg(long, default_value = "equal", help = "XOR challenge strategy: equal, random, derived")]
    strategy: ChallengeStrategy,

    #[arg(long, default_value = "0", allow_negative_numbers = true, help = "Mean stage delay")]
    mean: f64,

    #[arg(long, default_value = "1", help = "Standard deviation of stage delays")]
    stdev: f64,

    #[arg(long, default_value = "0", help = "PUF seed")]
    seed: u64,

    #[arg(long, default_value = "1000", help = "Number of CRPs")]
    count: usize,

    #[arg(long, default_value = "10", help = "CRPs to print in text mode")]
    show: usize,

    #[arg(long, help = "Print the whole batch as JSON")]
    json: bool,
}

#[derive(Serialize)]
struct CrpRecord {
    /// One hex-encoded challenge per arbiter chain, stage 0 in the MSB.
    challenges: Vec<String>,
    response: i8,
}

#[derive(Serialize)]
struct Report {
    kind: Kind,
    num_bits: usize,
    num_branches: usize,
    seed: u64,
    crps: Vec<CrpRecord>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let puf_config = PufConfig {
        num_bits: args.bits,
        mean: args.mean,
        stdev: args.stdev,
        seed: args.seed,
    };
    let mut rng = ChaCha20Rng::seed_from_u64(args.seed.wrapping_add(0x12345678));

    let (challenges, responses): (Array3<u8>, Array1<f64>) = match args.kind {
        Kind::Arbiter => {
            let puf = ArbiterPuf::from_config(&puf_config)?;
            let crps = puf.generate_crps(args.count, &mut rng);
            (crps.challenges.insert_axis(Axis(0)), crps.responses)
        }
        Kind::Xor => {
            let puf = XorArbiterPuf::from_config(&XorConfig {
                puf: puf_config,
                num_xor: args.branches,
                strategy: args.strategy,
            })?;
            let crps = puf.generate_crps(args.count, &mut rng);
            (crps.challenges, crps.responses)
        }
        Kind::Bent => {
            let puf = BentArbiterPuf::from_config(&BentConfig {
                puf: puf_config,
                num_pufs: args.branches,
            })?;
            let crps = puf.generate_crps(args.count, &mut rng);
            (crps.challenges, crps.responses)
        }
    };

    let crps: Vec<CrpRecord> = responses
        .iter()
        .enumerate()
        .map(|(col, &response)| CrpRecord {
            challenges: challenges
                .outer_iter()
                .map(|branch| hex::encode(pack_bits(branch.column(col))))
                .collect(),
            response: response as i8,
        })
        .collect();

    let report = Report {
        kind: args.kind,
        num_bits: args.bits,
        num_branches: challenges.len_of(Axis(0)),
        seed: args.seed,
        crps,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let ones = report.crps.iter().filter(|crp| crp.response > 0).count();
    println!("PUF CRPs Generated");
    println!("==================");
    println!("Kind: {:?}", report.kind);
    println!("Stages: {}", report.num_bits);
    println!("Arbiter chains: {}", report.num_branches);
    println!("CRPs: {}", report.crps.len());
    println!(
        "Response bias (+1 share): {:.4}",
        ones as f64 / report.crps.len().max(1) as f64
    );
    println!(
        "\nFirst {} CRPs (challenge hex per chain -> response):",
        args.show.min(report.crps.len())
    );
    for crp in report.crps.iter().take(args.show) {
        println!("  {} -> {:+}", crp.challenges.join(" "), crp.response);
    }
    Ok(())
}

/// Packs a 0/1 column MSB-first into bytes.
fn pack_bits(bits: ArrayView1<'_, u8>) -> Vec<u8> {
    let mut bytes = vec![0u8; (bits.len() + 7) / 8];
    for (i, &bit) in bits.iter().enumerate() {
        bytes[i / 8] |= (bit & 1) << (7 - i % 8);
    }
    bytes
}
