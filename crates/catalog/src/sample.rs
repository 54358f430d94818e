//! Random but well-formed laptops, for demos and tests.

use rand::Rng;
use rand::seq::SliceRandom;
use uuid::Uuid;

use crate::model::{
    Cpu, Gpu, Keyboard, Laptop, Memory, Resolution, Screen, Storage, keyboard::Layout, laptop,
    memory::Unit, screen::Panel, storage::Driver,
};

/// A new laptop with a fresh ID and random specs.
///
/// Core counts are at least 1 and every frequency range has
/// `min_ghz <= max_ghz`.
pub fn new_laptop() -> Laptop {
    let mut rng = rand::thread_rng();
    let brand = pick(&mut rng, &["Apple", "Dell", "Lenovo"]);
    let name = match brand {
        "Apple" => pick(&mut rng, &["Macbook Air", "Macbook Pro"]),
        "Dell" => pick(&mut rng, &["Latitude", "Vostro", "XPS", "Alienware"]),
        _ => pick(&mut rng, &["Thinkpad X1", "Thinkpad P1", "Thinkpad P53"]),
    };

    Laptop {
        id: Uuid::new_v4().to_string(),
        brand: brand.to_string(),
        name: name.to_string(),
        cpu: Some(new_cpu(&mut rng)),
        ram: Some(Memory::new(rng.gen_range(4..=64), Unit::Gigabyte)),
        gpus: vec![new_gpu(&mut rng)],
        storages: vec![
            Storage {
                driver: Driver::Ssd as i32,
                memory: Some(Memory::new(rng.gen_range(128..=1024), Unit::Gigabyte)),
            },
            Storage {
                driver: Driver::Hdd as i32,
                memory: Some(Memory::new(rng.gen_range(1..=6), Unit::Terabyte)),
            },
        ],
        screen: Some(new_screen(&mut rng)),
        keyboard: Some(Keyboard {
            layout: *[Layout::Qwerty, Layout::Qwertz, Layout::Azerty]
                .choose(&mut rng)
                .unwrap_or(&Layout::Qwerty) as i32,
            backlit: rng.gen_bool(0.5),
        }),
        weight: Some(laptop::Weight::WeightKg(rng.gen_range(1.0..3.0))),
        price_usd: rng.gen_range(1500.0..3500.0),
        release_year: rng.gen_range(2015..=2024),
    }
}

/// A score between 1 and 10.
pub fn random_laptop_score() -> f64 {
    f64::from(rand::thread_rng().gen_range(1u32..=10))
}

fn pick<R: Rng>(rng: &mut R, choices: &[&'static str]) -> &'static str {
    choices.choose(rng).copied().unwrap_or_default()
}

fn new_cpu<R: Rng>(rng: &mut R) -> Cpu {
    let brand = pick(rng, &["Intel", "AMD"]);
    let name = match brand {
        "Intel" => pick(
            rng,
            &[
                "Xeon E-2286M",
                "Core i9-9980HK",
                "Core i7-9750H",
                "Core i5-9400F",
                "Core i3-1005G1",
            ],
        ),
        _ => pick(
            rng,
            &[
                "Ryzen 7 PRO 2700U",
                "Ryzen 5 PRO 3500U",
                "Ryzen 3 PRO 3200GE",
            ],
        ),
    };
    let number_cores = rng.gen_range(2..=8);
    let min_ghz = rng.gen_range(2.0..3.5);

    Cpu {
        brand: brand.to_string(),
        name: name.to_string(),
        number_cores,
        number_threads: rng.gen_range(number_cores..=12),
        min_ghz,
        max_ghz: rng.gen_range(min_ghz..5.0),
    }
}

fn new_gpu<R: Rng>(rng: &mut R) -> Gpu {
    let brand = pick(rng, &["Nvidia", "AMD"]);
    let name = match brand {
        "Nvidia" => pick(rng, &["RTX 2060", "RTX 2070", "GTX 1660-Ti", "GTX 1070"]),
        _ => pick(rng, &["RX 590", "RX 580", "RX 5700-XT", "RX Vega-56"]),
    };
    let min_ghz = rng.gen_range(1.0..1.5);

    Gpu {
        brand: brand.to_string(),
        name: name.to_string(),
        min_ghz,
        max_ghz: rng.gen_range(min_ghz..2.0),
        memory: Some(Memory::new(rng.gen_range(2..=6), Unit::Gigabyte)),
    }
}

fn new_screen<R: Rng>(rng: &mut R) -> Screen {
    let height = rng.gen_range(1080..=4320);
    let width = height * 16 / 9;

    Screen {
        size_inch: rng.gen_range(13.0..17.0),
        resolution: Some(Resolution { width, height }),
        panel: if rng.gen_bool(0.5) {
            Panel::Ips as i32
        } else {
            Panel::Oled as i32
        },
        multitouch: rng.gen_bool(0.5),
    }
}
