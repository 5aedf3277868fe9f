//! ERC-20 bindings used by the faucet.

use alloy::sol;

sol! {
    /// Subset of the ERC-20 interface needed to move and read balances.
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
    }
}

/// Selector of OpenZeppelin v5's `ERC20InsufficientBalance(address,uint256,uint256)`.
pub const INSUFFICIENT_BALANCE_SELECTOR: &str = "0xe450d38c";

/// Whether a revert reason or revert data indicates the sender's balance is too low.
pub fn is_insufficient_balance_revert(reason: &str, data: Option<&str>) -> bool {
    let lower = reason.to_lowercase();
    lower.contains("exceeds balance")
        || lower.contains("insufficient balance")
        || lower.contains(INSUFFICIENT_BALANCE_SELECTOR)
        || data
            .map(|d| d.to_lowercase().starts_with(INSUFFICIENT_BALANCE_SELECTOR))
            .unwrap_or(false)
}
