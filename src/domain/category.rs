use serde::{Deserialize, Serialize};

/// Classification used by every aggregate.
///
/// Labels that are not one of the four known categories are kept verbatim in
/// `Unknown` so they survive a load/save cycle, and are excluded from all sums.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Income,
    Expenses,
    Savings,
    Investments,
    Unknown(String),
}

impl Category {
    pub const KNOWN: [Category; 4] = [
        Category::Income,
        Category::Expenses,
        Category::Savings,
        Category::Investments,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Category::Income => "income",
            Category::Expenses => "expenses",
            Category::Savings => "savings",
            Category::Investments => "investments",
            Category::Unknown(label) => label,
        }
    }

    /// Strict lookup, for validating user input. Returns `None` for unknown labels.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(Category::Income),
            "expenses" | "expense" => Some(Category::Expenses),
            "savings" => Some(Category::Savings),
            "investments" | "investment" => Some(Category::Investments),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Category::Unknown(_))
    }

    /// Subcategories offered to the user when recording. Not enforced.
    pub fn suggested_subcategories(&self) -> &'static [&'static str] {
        match self {
            Category::Income => &["salary", "freelance", "investments", "other"],
            Category::Expenses => &[
                "housing",
                "food",
                "transport",
                "utilities",
                "entertainment",
                "other",
            ],
            Category::Savings => &["emergency", "retirement", "goals"],
            Category::Investments => &["stocks", "bonds", "crypto", "real_estate"],
            Category::Unknown(_) => &[],
        }
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        match label.as_str() {
            "income" => Category::Income,
            "expenses" => Category::Expenses,
            "savings" => Category::Savings,
            "investments" => Category::Investments,
            _ => Category::Unknown(label),
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Unknown(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The bucket a transaction moves money in or out of.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(from = "String", into = "String")]
pub enum Account {
    #[default]
    Bank,
    Cash,
    Invested,
    Crypto,
    Other,
    Unknown(String),
}

impl Account {
    pub const KNOWN: [Account; 5] = [
        Account::Bank,
        Account::Cash,
        Account::Invested,
        Account::Crypto,
        Account::Other,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Account::Bank => "bank",
            Account::Cash => "cash",
            Account::Invested => "invested",
            Account::Crypto => "crypto",
            Account::Other => "other",
            Account::Unknown(label) => label,
        }
    }

    /// Strict lookup, for validating user input. Returns `None` for unknown labels.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "bank" => Some(Account::Bank),
            "cash" => Some(Account::Cash),
            "invested" => Some(Account::Invested),
            "crypto" => Some(Account::Crypto),
            "other" => Some(Account::Other),
            _ => None,
        }
    }

    /// Best-effort guess for records written before the account field existed.
    /// Case-insensitive substring match on the description, first hit wins.
    pub fn infer_from_description(description: &str) -> Self {
        let description = description.to_lowercase();
        if description.contains("cash") {
            Account::Cash
        } else if description.contains("bank") {
            Account::Bank
        } else if description.contains("invest") {
            Account::Invested
        } else {
            Account::Bank
        }
    }
}

impl From<String> for Account {
    fn from(label: String) -> Self {
        match label.as_str() {
            "bank" => Account::Bank,
            "cash" => Account::Cash,
            "invested" => Account::Invested,
            "crypto" => Account::Crypto,
            "other" => Account::Other,
            _ => Account::Unknown(label),
        }
    }
}

impl From<Account> for String {
    fn from(account: Account) -> Self {
        match account {
            Account::Unknown(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
