use std::env;
use std::process;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bullion_cart::feed::{FALLBACK_INR_FX, QuoteSource, SampleQuotes};
use bullion_cart::store::CartStore;
use bullion_cart::{CartEngine, JsonFileStore, Metal, PriceFeed, SpotQuotes};

const USAGE: &str = "usage: bullion-cart <cart.json> [--currency USD|INR] \
    <show | add <metal> <grams> | set <metal> <grams> <qty> | remove <metal> <grams> | clear>";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let (cart_path, currency, command) = parse_args(env::args().skip(1).collect());

    let fx = match currency.as_str() {
        "USD" => 1.0,
        "INR" => FALLBACK_INR_FX,
        other => {
            eprintln!("unsupported display currency '{other}' (expected USD or INR)");
            process::exit(2);
        }
    };

    let spot = match SampleQuotes.fetch().await {
        Ok(spot) => spot,
        Err(e) => {
            warn!(error = %e, "quote fetch failed, using offline sample quotes");
            SpotQuotes::offline_sample()
        }
    };
    let feed = PriceFeed::new(spot, currency, fx);

    let mut engine = CartEngine::load(JsonFileStore::new(&cart_path));

    match command.first().map(String::as_str) {
        None | Some("show") => {}
        Some("add") => {
            let (metal, weight_grams) = metal_and_weight(&command);
            match engine.add_item(&feed, metal, weight_grams) {
                Ok(added) => {
                    info!(metal = %added.metal, weight_grams = added.weight_grams, "added to cart");
                }
                Err(e) => {
                    eprintln!("{e}");
                    process::exit(1);
                }
            }
        }
        Some("set") => {
            let (metal, weight_grams) = metal_and_weight(&command);
            let quantity: i64 = command
                .get(3)
                .expect(USAGE)
                .parse()
                .expect("quantity must be a whole number");
            engine.set_quantity(metal, weight_grams, quantity.max(0) as u32);
        }
        Some("remove") => {
            let (metal, weight_grams) = metal_and_weight(&command);
            engine.remove_item(metal, weight_grams);
        }
        Some("clear") => engine.clear(),
        Some(other) => {
            eprintln!("unknown command '{other}'\n{USAGE}");
            process::exit(2);
        }
    }

    render(&engine, &feed);
}

/// Split args into the cart path, the display currency, and the command words.
fn parse_args(args: Vec<String>) -> (String, String, Vec<String>) {
    let mut cart_path = None;
    let mut currency = "USD".to_string();
    let mut command = Vec::new();

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--currency" {
            currency = iter.next().expect(USAGE);
        } else if cart_path.is_none() {
            cart_path = Some(arg);
        } else {
            command.push(arg);
        }
    }

    (cart_path.expect(USAGE), currency, command)
}

fn metal_and_weight(command: &[String]) -> (Metal, u32) {
    let metal = command
        .get(1)
        .expect(USAGE)
        .parse::<Metal>()
        .expect("metal must be gold, silver, platinum or palladium");
    let weight_grams = command
        .get(2)
        .expect(USAGE)
        .parse::<u32>()
        .expect("weight must be whole grams");
    (metal, weight_grams)
}

/// Print the cart as csv-ish rows followed by the live grand total.
fn render<S: CartStore>(engine: &CartEngine<S>, feed: &PriceFeed) {
    println!("metal,weight_g,quantity,line_total");
    for item in engine.items() {
        println!(
            "{},{},{},{}",
            item.metal,
            item.weight_grams,
            item.quantity,
            engine.line_total(feed, item)
        );
    }
    println!("total,{},{}", feed.currency, engine.cart_total(feed));
}
