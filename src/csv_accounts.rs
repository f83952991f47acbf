use serde::Serialize;

use crate::portfolio::{Account, Asset};

pub(crate) struct Writer<W>(W);

impl<W> Writer<W> {
    pub fn from_writer(writer: W) -> Writer<W> {
        Writer(writer)
    }
}

impl<W: std::io::Write> Writer<W> {
    /// Writes one row per account and symbol. Rows come out in whatever order
    /// the iterator yields accounts.
    pub fn write_all<'a, I: Iterator<Item = &'a Account>>(
        self,
        accounts_iterator: I,
    ) -> Result<(), csv::Error> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(self.0);

        // Header is written up front so an empty portfolio still has one.
        writer.write_record(&[
            "account_name",
            "account_number",
            "symbol",
            "shares",
            "cost_basis",
            "market_value",
            "cost_basis_per_share",
        ])?;

        for account in accounts_iterator {
            for asset in account.assets.values() {
                log_asset(account, asset);
                writer.serialize(AssetRecord::new(account, asset))?;
            }
        }

        writer.flush()?;

        Ok(())
    }
}

fn log_asset(account: &Account, asset: &Asset) {
    log::info!(
        "Account: {}, Symbol: {}, Shares: {}, CostBasis: {}, MarketValue: {}, Cost Basis Per Share: {}",
        account.name,
        asset.symbol,
        asset.total_shares,
        asset.total_cost_basis,
        asset.total_market_value,
        asset.cost_basis_per_share
    );
}

/// CSV-serializable view of one asset within an account
#[derive(Debug, Serialize)]
struct AssetRecord<'a> {
    account_name: &'a str,
    account_number: &'a str,
    symbol: &'a str,
    shares: f64,
    cost_basis: f64,
    market_value: f64,
    cost_basis_per_share: f64,
}

impl<'a> AssetRecord<'a> {
    fn new(account: &'a Account, asset: &'a Asset) -> AssetRecord<'a> {
        AssetRecord {
            account_name: &account.name,
            account_number: &account.account_number,
            symbol: &asset.symbol,
            shares: asset.total_shares,
            cost_basis: asset.total_cost_basis,
            market_value: asset.total_market_value,
            cost_basis_per_share: asset.cost_basis_per_share,
        }
    }
}
