use block_map_ftl::config::*;
use block_map_ftl::{Ftl, FtlError};
use log::{info, warn, LevelFilter};
use rand::prelude::*;
use simplelog::*;
use time::macros::format_description;

const ROUNDS: usize = 4;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let log_cfg = ConfigBuilder::new()
        .set_time_format_custom(format_description!("[hour]:[minute]:[second].[subsecond]"))
        .build();

    SimpleLogger::init(LevelFilter::Info, log_cfg)?;

    let mut fw = Ftl::default();
    fw.initialize();
    info!("Capacity: {}", fw.geometry().capacity_human());

    fw.write(10, 5, b"Hello")?;
    let page = fw.read(10, 5)?.unwrap_or_default();
    let text = page.split(|&b| b == 0).next().unwrap_or_default();
    println!("Read data: {}", String::from_utf8_lossy(text));

    let max_lba = fw.get_max_lba();
    let pages = fw.geometry().pages_per_block;
    let mut rng: SmallRng = SmallRng::seed_from_u64(7);

    for c in 0..ROUNDS {
        let mut failed = 0;
        for _ in 0..=max_lba {
            let lba = rng.gen_range(0..=max_lba);
            let page: PageId = rng.gen_range(0..pages);
            match fw.write(lba, page, &lba.to_le_bytes()) {
                Ok(()) => {}
                Err(FtlError::NoFreeBlock) => failed += 1,
                Err(e) => return Err(e.into()),
            }
        }
        if failed > 0 {
            warn!("Round {}: {} writes found no free block", c, failed);
        }
        info!("Round {} written, {} blocks free", c, fw.free_blocks());
    }

    fw.verify()?;
    let stats = fw.stats();
    info!(
        "host writes: {}, relocations: {}, reclaims: {}, erases: {}, WA: {:.2}",
        stats.host_writes,
        stats.relocations,
        stats.reclaims,
        stats.erases,
        stats.write_amplification()
    );

    Ok(())
}
