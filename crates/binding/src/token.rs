//! ERC20 token contract bindings.

use alloy_sol_types::sol;

sol! {
    /// Read-only subset of the standard ERC20 token interface
    interface IERC20 {
        /// Get token name
        function name() external view returns (string memory);

        /// Get token symbol
        function symbol() external view returns (string memory);

        /// Get token decimals
        function decimals() external view returns (uint8);

        /// Get total supply
        function totalSupply() external view returns (uint256);

        /// Get token balance of an account
        function balanceOf(address _owner) external view returns (uint256 balance);
    }
}
