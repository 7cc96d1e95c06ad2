use clap::Parser;
use slim_map::SlimMap;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'n', long = "keys", default_value_t = 1000)]
    keys: u64,
}

fn main() {
    let args = Args::parse();

    let mut map: SlimMap<u64, u64> = SlimMap::new();
    println!(
        "Fresh map: len {} / capacity {} (nothing allocated yet)",
        map.len(),
        map.capacity()
    );

    let mut path = vec![map.capacity()];
    for key in 0..args.keys {
        *map.get_or_insert_mut(key) = key * key;
        if map.capacity() != *path.last().unwrap() {
            path.push(map.capacity());
        }
    }

    println!("Inserted {} distinct keys", args.keys);
    println!("Capacity path: {:?}", path);
    println!(
        "Final occupancy: {} / {} ({:.1}%)",
        map.len(),
        map.capacity(),
        if map.capacity() == 0 {
            0.0
        } else {
            (map.len() as f64 / map.capacity() as f64) * 100.0
        }
    );

    let mut stale = 0u64;
    for key in 0..args.keys {
        if *map.get_or_insert_mut(key) != key * key {
            stale += 1;
        }
    }
    println!("Re-checked every key after growth: {} mismatches", stale);
}
