//! ERC20 token contract bindings.

use alloy_sol_types::sol;

sol! {
    /// Read-only slice of the ERC20 interface used for balance aggregation
    #[sol(rpc)]
    interface IERC20 {
        /// Get token balance of an account
        function balanceOf(address account) external view returns (uint256);

        /// Get token decimals
        function decimals() external view returns (uint8);

        /// Get token symbol
        function symbol() external view returns (string memory);

        /// Get token name
        function name() external view returns (string memory);
    }
}
