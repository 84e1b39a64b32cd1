use alloy::sol;

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface IDropperFactory {
        function releaseAirdrops(
            address[] calldata droppers,
            address[][] calldata froms,
            uint256[][] calldata indexes
        ) external;
    }
}
