use std::collections::HashMap;

/// Somewhere to fold decoded lots into. The reader only ever calls [`Portfolio::fold`]
/// and the writer only ever walks the resulting accounts.
pub(crate) trait Portfolio<'a> {
    type AccountsIterator: Iterator<Item = &'a Account>;

    fn get_accounts(&'a self) -> Self::AccountsIterator;

    fn fold(&mut self, lot: Lot);
}

/// A single decoded row: one purchase of one symbol within one account.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Lot {
    pub account_name: String,
    pub account_number: String,
    pub holding: Holding,
}

/// The numeric part of a lot. Only ever built from a row where all three
/// numbers parsed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Holding {
    pub symbol: String,
    pub shares: f64,
    pub cost_basis: f64,
    pub market_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Asset {
    pub symbol: String,
    pub total_shares: f64,
    pub total_cost_basis: f64,
    pub total_market_value: f64,
    pub cost_basis_per_share: f64,
}

impl Asset {
    pub fn from_holding(holding: Holding) -> Asset {
        let mut asset = Asset {
            symbol: holding.symbol,
            total_shares: holding.shares,
            total_cost_basis: holding.cost_basis,
            total_market_value: holding.market_value,
            cost_basis_per_share: 0.0,
        };
        asset.recompute_cost_basis_per_share();
        asset
    }

    pub fn add(&mut self, holding: &Holding) {
        self.total_shares += holding.shares;
        self.total_cost_basis += holding.cost_basis;
        self.total_market_value += holding.market_value;
        self.recompute_cost_basis_per_share();
    }

    /// Zero total shares yields `inf` or `NaN`; the ratio is stored as is.
    fn recompute_cost_basis_per_share(&mut self) {
        if self.total_shares == 0.0 {
            log::warn!(
                "Total shares for {} is zero, cost basis per share is undefined",
                self.symbol
            );
        }
        self.cost_basis_per_share = self.total_cost_basis / self.total_shares;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Account {
    pub name: String,
    pub account_number: String,
    pub assets: HashMap<String, Asset>,
}

impl Account {
    pub fn new(name: String, account_number: String) -> Account {
        Account {
            name,
            account_number,
            assets: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holding(shares: f64, cost_basis: f64, market_value: f64) -> Holding {
        Holding {
            symbol: "VWO".into(),
            shares,
            cost_basis,
            market_value,
        }
    }

    #[test]
    fn first_holding_gets_cost_basis_per_share() {
        let asset = Asset::from_holding(holding(10.0, 490.0, 500.0));

        assert_eq!(10.0, asset.total_shares);
        assert_eq!(490.0, asset.total_cost_basis);
        assert_eq!(500.0, asset.total_market_value);
        assert_eq!(49.0, asset.cost_basis_per_share);
    }

    #[test]
    fn adding_holding_recomputes_weighted_average() {
        let mut asset = Asset::from_holding(holding(10.0, 490.0, 500.0));
        asset.add(&holding(5.0, 255.0, 260.0));

        assert_eq!(15.0, asset.total_shares);
        assert_eq!(745.0, asset.total_cost_basis);
        assert_eq!(760.0, asset.total_market_value);
        assert_eq!(745.0 / 15.0, asset.cost_basis_per_share);
    }

    #[test]
    fn zero_shares_is_not_guarded() {
        let asset = Asset::from_holding(holding(0.0, 100.0, 0.0));
        assert!(asset.cost_basis_per_share.is_infinite());

        let asset = Asset::from_holding(holding(0.0, 0.0, 0.0));
        assert!(asset.cost_basis_per_share.is_nan());
    }

    #[test]
    fn shares_cancelling_out_is_not_guarded() {
        let mut asset = Asset::from_holding(holding(5.0, 100.0, 100.0));
        asset.add(&holding(-5.0, 20.0, -100.0));

        assert_eq!(0.0, asset.total_shares);
        assert!(asset.cost_basis_per_share.is_infinite());
    }
}
