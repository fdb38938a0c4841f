use barry_energy_api::{today_start, yesterday_start, BarryClient, PriceArea};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let client = BarryClient::from_env().expect("Creating the client failed.");

    let prices = client
        .spot_prices(PriceArea::DkNordpoolSpotDk1, yesterday_start(), today_start())
        .expect("Querying prices failed.");

    println!("Spot prices for yesterday:");
    for (start, price) in prices {
        println!("{start}: {price:.04} DKK/kWh");
    }

    let consumption = client
        .metering_point_consumption(yesterday_start(), today_start())
        .expect("Querying consumption failed.");

    for (mpid, series) in consumption {
        println!("{mpid}: {:.02} kWh", series.values().sum::<f64>());
    }
}
