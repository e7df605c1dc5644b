use crate::cli::RunArgs;
use crate::config::RunFile;
use crate::error::{CliError, Result};
use crankmc::core::models::builder::ConformationBuilder;
use crankmc::core::models::chain::Conformation;
use crankmc::engine::amplitude::{ADJUSTMENT_WINDOW, CalibrationMode};
use crankmc::engine::driver::MoveDriver;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

/// How often the production progress bar refreshes its energy readout.
const REPORT_INTERVAL: u64 = 256;

pub fn run(args: RunArgs) -> Result<()> {
    let mut file = match &args.config {
        Some(path) => RunFile::load(path)?,
        None => RunFile::default(),
    };
    file.apply_overrides(&args);

    let sequence = file.run.sequence.clone().ok_or_else(|| {
        CliError::Config("no sequence given; set [run].sequence or pass --sequence".into())
    })?;

    let mut builder = ConformationBuilder::new(&sequence);
    for &index in &file.run.fixed {
        builder = builder.fix_residue(index);
    }
    let mut chain = builder.build()?;

    let model = file.model.to_model();
    let config = file.sampling();
    let mut driver = MoveDriver::new(&chain, config, &model)?;
    let mut rng = match file.run.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut curr_e = driver.total_energy();
    info!(
        sequence = %chain.sequence_string(),
        naa = chain.naa() - 1,
        nchains = chain.nchains(),
        initial_energy = curr_e,
        "starting run"
    );

    calibrate(&mut driver, &mut chain, &model, &file, &mut curr_e, &mut rng)?;
    produce(&mut driver, &mut chain, &model, &file, &mut curr_e, &mut rng)?;

    println!("Final energy:     {curr_e:>12.4}");
    println!("Acceptance rate:  {:>12.4}", driver.acceptance_rate());
    println!("Amplitude:        {:>12.4}", driver.amplitude());
    Ok(())
}

/// Tunes the rotation amplitude toward the target acceptance rate over
/// whole adjustment windows. The first recorded outcome resets the
/// controller's counters so a previous run's statistics cannot leak in.
fn calibrate(
    driver: &mut MoveDriver,
    chain: &mut Conformation,
    model: &crankmc::core::energy::CaContactModel,
    file: &RunFile,
    curr_e: &mut f64,
    rng: &mut StdRng,
) -> Result<()> {
    let total = file.run.calibration_windows * ADJUSTMENT_WINDOW;
    if total == 0 {
        return Ok(());
    }
    let bar = progress_bar(total, "Calibrating amplitude");
    for step in 0..total {
        let mode = if step == 0 {
            CalibrationMode::Reset
        } else {
            CalibrationMode::Tuning
        };
        driver.step(chain, model, file.run.log_l_star, curr_e, mode, rng)?;
        bar.inc(1);
    }
    bar.finish_and_clear();
    info!(
        amplitude = driver.amplitude(),
        acceptance_rate = driver.acceptance_rate(),
        "calibration finished"
    );
    Ok(())
}

fn produce(
    driver: &mut MoveDriver,
    chain: &mut Conformation,
    model: &crankmc::core::energy::CaContactModel,
    file: &RunFile,
    curr_e: &mut f64,
    rng: &mut StdRng,
) -> Result<()> {
    let total = file.run.steps;
    let bar = progress_bar(total, "Sampling");
    for step in 0..total {
        driver.step(
            chain,
            model,
            file.run.log_l_star,
            curr_e,
            CalibrationMode::Fixed,
            rng,
        )?;
        bar.inc(1);
        if step % REPORT_INTERVAL == 0 {
            bar.set_message(format!("Sampling (E = {curr_e:.3})"));
        }
    }
    bar.finish_and_clear();
    info!(
        steps = total,
        final_energy = *curr_e,
        acceptance_rate = driver.acceptance_rate(),
        "sampling finished"
    );
    Ok(())
}

fn progress_bar(total: u64, message: &str) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("{msg:<35} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar.set_message(message.to_string());
    bar
}
