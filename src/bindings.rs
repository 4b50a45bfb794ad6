use alloy::sol;

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface T1Bridge {
        function sendMessage(
            address _to,
            uint256 _value,
            bytes calldata _message,
            uint256 _gasLimit,
            uint64 _destChainId,
            address _callbackAddress
        ) external payable;
    }
);

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface L2StandardBridge {
        function bridgeETH(uint32 _l1Gas, bytes calldata _data) external payable;
    }
);
