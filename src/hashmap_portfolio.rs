use std::collections::{
    hash_map::{Entry, Values},
    HashMap,
};

use crate::portfolio::{Account, Asset, Lot, Portfolio};

/// In-memory implementation of a portfolio which groups lots by account number
/// and then by symbol.
#[derive(Debug, Default)]
pub(crate) struct HashMapPortfolio {
    accounts_by_number: HashMap<String, Account>,
}

impl HashMapPortfolio {
    pub fn new() -> HashMapPortfolio {
        HashMapPortfolio {
            accounts_by_number: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub fn get_account(&self, account_number: &str) -> Option<&Account> {
        self.accounts_by_number.get(account_number)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.accounts_by_number.len()
    }
}

impl<'a> Portfolio<'a> for HashMapPortfolio {
    type AccountsIterator = Values<'a, String, Account>;

    fn get_accounts(&'a self) -> Self::AccountsIterator {
        self.accounts_by_number.values()
    }

    fn fold(&mut self, lot: Lot) {
        let Lot {
            account_name,
            account_number,
            holding,
        } = lot;

        // The first row seen for an account fixes its name; later rows are not reconciled.
        let account = self
            .accounts_by_number
            .entry(account_number)
            .or_insert_with_key(|number| Account::new(account_name, number.clone()));

        match account.assets.entry(holding.symbol.clone()) {
            Entry::Occupied(mut entry) => entry.get_mut().add(&holding),
            Entry::Vacant(entry) => {
                log::debug!(
                    "Asset {} not found in account {}, adding it",
                    entry.key(),
                    account.account_number
                );
                entry.insert(Asset::from_holding(holding));
            }
        }
    }
}
