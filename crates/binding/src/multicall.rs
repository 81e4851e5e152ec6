//! Multicall3 contract bindings.
//!
//! Only `aggregate3` is bound: every leaf call carries its own `allowFailure`
//! flag, so one reverting call does not abort the rest of the batch.

use alloy_sol_types::sol;

sol! {
    /// Multicall3 aggregator
    /// See: https://github.com/mds1/multicall3/blob/main/src/Multicall3.sol
    #[sol(rpc)]
    interface IMulticall3 {
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        struct Call3Result {
            bool success;
            bytes returnData;
        }

        /// Aggregate calls, ensuring each returns success if required
        function aggregate3(Call3[] calldata calls)
            external
            payable
            returns (Call3Result[] memory returnData);
    }
}
