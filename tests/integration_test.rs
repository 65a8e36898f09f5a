use flash_mint_sdk::flash_loan::BorrowerInstruction;
use flash_mint_sdk::prelude::*;
use rand::Rng;
use std::collections::BTreeMap;
use std::thread;

struct Deployment {
    owner: Address,
    ledger: Ledger,
    lender: FlashLender,
    faucet: LiquiditySource,
    borrower: FlashSwap,
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Token at 100 bps, lender with the minter role, faucet funded with `reserve`
fn deploy(reserve: Amount) -> Deployment {
    init_logger();
    let owner = Address::new_unique();
    let ledger = Ledger::new(TokenConfig::new("Stonks Token", "Stt", 100), owner).unwrap();
    let lender = FlashLender::new(ledger.clone(), Address::new_unique()).unwrap();
    ledger.grant_minter(&owner, lender.address()).unwrap();

    let faucet = LiquiditySource::new(ledger.clone(), Address::new_unique());
    ledger.mint(&owner, &faucet.address(), reserve).unwrap();

    let mut borrower = FlashSwap::new(ledger.clone(), Address::new_unique());
    borrower.connect(&faucet).unwrap();

    Deployment {
        owner,
        ledger,
        lender,
        faucet,
        borrower,
    }
}

fn snapshot(ledger: &Ledger) -> (BTreeMap<Address, Amount>, Amount) {
    (ledger.balances(), ledger.total_supply())
}

/// Receiver that tries to take a second loan from the same lender while its own is live
struct Reentrant<'a> {
    lender: &'a FlashLender,
    address: Address,
    from_other_thread: bool,
}

impl FlashLoanReceiver for Reentrant<'_> {
    fn address(&self) -> Address {
        self.address
    }

    fn on_flash_loan(
        &mut self,
        _ctx: &LoanContext<'_>,
        amount: Amount,
        _fee: Amount,
        _data: &[u8],
    ) -> FlashResult<()> {
        let lender = self.lender;
        let mut inner = FlashSwap::new(lender.ledger().clone(), Address::new_unique());
        if self.from_other_thread {
            thread::scope(|s| {
                s.spawn(|| lender.flash_loan(&mut inner, amount, &[]))
                    .join()
                    .map_err(|_| FlashError::CallbackFailed("loan thread panicked".to_string()))?
            })?;
        } else {
            lender.flash_loan(&mut inner, amount, &[])?;
        }
        Ok(())
    }
}

/// Receiver that fails on purpose after moving funds around
struct Failing {
    address: Address,
    sink: Address,
}

impl FlashLoanReceiver for Failing {
    fn address(&self) -> Address {
        self.address
    }

    fn on_flash_loan(
        &mut self,
        ctx: &LoanContext<'_>,
        amount: Amount,
        _fee: Amount,
        _data: &[u8],
    ) -> FlashResult<()> {
        ctx.transfer(&self.sink, amount)?;
        Err(FlashError::CallbackFailed("strategy aborted".to_string()))
    }
}

#[test]
fn test_successful_flash_swap() {
    let mut d = deploy(tokens(1_000));
    let supply_before = d.ledger.total_supply();

    let outcome = d
        .borrower
        .flash_borrow(&d.lender, tokens(10), &d.faucet, tokens(5))
        .unwrap();

    assert_eq!(outcome.loan.principal, tokens(10));
    assert_eq!(outcome.loan.fee, parse_units("0.1").unwrap());
    assert_eq!(outcome.loan.due, parse_units("10.1").unwrap());
    assert_eq!(outcome.profit, parse_units("4.9").unwrap());
    assert_eq!(d.borrower.balance(), parse_units("4.9").unwrap());
    assert_eq!(d.faucet.reserve(), tokens(995));
    // The fee is destroyed
    assert_eq!(d.ledger.total_supply(), supply_before - outcome.loan.fee);
    assert!(d.ledger.is_conserved());
}

#[test]
fn test_underfunded_flash_swap_rolls_back() {
    let mut d = deploy(tokens(1_000));
    let before = snapshot(&d.ledger);

    let err = d
        .borrower
        .flash_borrow(&d.lender, tokens(10), &d.faucet, parse_units("0.05").unwrap())
        .unwrap_err();

    assert_eq!(
        err,
        FlashError::RepaymentShortfall {
            borrower: d.borrower.address(),
            due: parse_units("10.1").unwrap(),
            balance: parse_units("10.05").unwrap(),
        }
    );
    assert_eq!(err.kind(), "RepaymentShortfallError");
    assert_eq!(snapshot(&d.ledger), before);
}

#[test]
fn test_insufficient_reserve_rolls_back() {
    let mut d = deploy(tokens(3));
    let before = snapshot(&d.ledger);

    let err = d
        .borrower
        .flash_borrow(&d.lender, tokens(10), &d.faucet, tokens(5))
        .unwrap_err();

    assert!(matches!(err, FlashError::InsufficientReserve { requested, .. } if requested == tokens(5)));
    assert_eq!(snapshot(&d.ledger), before);
}

#[test]
fn test_failing_callback_rolls_back_transfers() {
    let d = deploy(tokens(1_000));
    let before = snapshot(&d.ledger);
    let mut receiver = Failing {
        address: Address::new_unique(),
        sink: Address::new_unique(),
    };

    let err = d.lender.flash_loan(&mut receiver, tokens(10), &[]).unwrap_err();

    assert_eq!(err, FlashError::CallbackFailed("strategy aborted".to_string()));
    assert_eq!(d.ledger.balance_of(&receiver.sink), 0);
    assert_eq!(snapshot(&d.ledger), before);
}

#[test]
fn test_zero_amount_rejected_without_touching_ledger() {
    let mut d = deploy(tokens(1_000));
    let before = snapshot(&d.ledger);
    let events_before = d.ledger.events().len();

    let err = d
        .borrower
        .flash_borrow(&d.lender, 0, &d.faucet, tokens(5))
        .unwrap_err();

    assert!(matches!(err, FlashError::InvalidAmount(_)));
    assert_eq!(snapshot(&d.ledger), before);
    assert_eq!(d.ledger.events().len(), events_before);
}

#[test]
fn test_nested_flash_loan_rejected() {
    let d = deploy(tokens(1_000));
    let before = snapshot(&d.ledger);
    let mut receiver = Reentrant {
        lender: &d.lender,
        address: Address::new_unique(),
        from_other_thread: false,
    };

    let err = d.lender.flash_loan(&mut receiver, tokens(10), &[]).unwrap_err();

    assert_eq!(
        err,
        FlashError::Reentrancy {
            lender: d.lender.address()
        }
    );
    assert_eq!(snapshot(&d.ledger), before);
}

#[test]
fn test_flash_loan_from_other_thread_rejected_while_in_flight() {
    let d = deploy(tokens(1_000));
    let before = snapshot(&d.ledger);
    let mut receiver = Reentrant {
        lender: &d.lender,
        address: Address::new_unique(),
        from_other_thread: true,
    };

    let err = d.lender.flash_loan(&mut receiver, tokens(10), &[]).unwrap_err();

    assert!(matches!(err, FlashError::Reentrancy { .. }));
    assert_eq!(snapshot(&d.ledger), before);
}

#[test]
fn test_fee_correctness() {
    let d = deploy(0);
    let mut rng = rand::rng();
    for _ in 0..100 {
        let principal: Amount = rng.random_range(1..=u64::MAX) as Amount * rng.random_range(1..1_000u32) as Amount;
        let fee = d.lender.flash_fee(principal).unwrap();
        assert_eq!(fee, principal * 100 / 10_000);
    }
    assert_eq!(d.lender.flash_fee(tokens(10)).unwrap(), parse_units("0.1").unwrap());
}

#[test]
fn test_conservation_over_random_swaps() {
    let mut d = deploy(tokens(10_000));
    let mut rng = rand::rng();

    for _ in 0..50 {
        let principal = tokens(rng.random_range(1..100));
        let extraction = tokens(rng.random_range(0..3)) + rng.random_range(0..WAD);
        let before = snapshot(&d.ledger);
        match d
            .borrower
            .flash_borrow(&d.lender, principal, &d.faucet, extraction)
        {
            Ok(outcome) => assert_eq!(d.ledger.total_supply(), before.1 - outcome.loan.fee),
            Err(_) => assert_eq!(snapshot(&d.ledger), before),
        }
        assert!(d.ledger.is_conserved());
        let sum: Amount = d.ledger.balances().values().sum();
        assert_eq!(sum, d.ledger.total_supply());
    }
}

#[test]
fn test_fee_recipient_keeps_supply() {
    let d = deploy(tokens(1_000));
    let treasury = Address::new_unique();
    let lender = FlashLender::new(d.ledger.clone(), Address::new_unique())
        .unwrap()
        .with_fee_recipient(treasury);
    d.ledger.grant_minter(&d.owner, lender.address()).unwrap();
    let mut borrower = FlashSwap::new(d.ledger.clone(), Address::new_unique());
    let supply_before = d.ledger.total_supply();

    borrower
        .flash_borrow(&lender, tokens(10), &d.faucet, tokens(5))
        .unwrap();

    assert_eq!(d.ledger.balance_of(&treasury), parse_units("0.1").unwrap());
    assert_eq!(borrower.balance(), parse_units("4.9").unwrap());
    assert_eq!(d.ledger.total_supply(), supply_before);
}

#[test]
fn test_callback_data_drives_extraction() {
    let mut d = deploy(tokens(1_000));
    let data = BorrowerInstruction::FlashSwap {
        faucet: d.faucet.address(),
        extraction: tokens(2),
    }
    .pack();

    let loan = d.lender.flash_loan(&mut d.borrower, tokens(10), &data).unwrap();

    assert_eq!(loan.borrower, d.borrower.address());
    assert_eq!(d.borrower.balance(), parse_units("1.9").unwrap());
    assert_eq!(d.faucet.reserve(), tokens(998));
}

#[test]
fn test_subscribers_see_settled_loans_only() {
    let mut d = deploy(tokens(1_000));
    let events = d.ledger.subscribe();
    let borrower = d.borrower.address();

    d.borrower
        .flash_borrow(&d.lender, tokens(10), &d.faucet, parse_units("0.05").unwrap())
        .unwrap_err();
    let failed: Vec<LedgerEvent> = events.try_iter().map(|r| r.event).collect();
    assert_eq!(
        failed,
        vec![LedgerEvent::LoanSettled {
            borrower,
            principal: tokens(10),
            fee: parse_units("0.1").unwrap(),
            success: false,
        }]
    );

    d.borrower
        .flash_borrow(&d.lender, tokens(10), &d.faucet, tokens(5))
        .unwrap();
    let settled: Vec<LedgerEvent> = events.try_iter().map(|r| r.event).collect();
    assert_eq!(
        settled,
        vec![
            LedgerEvent::Minted {
                to: borrower,
                amount: tokens(10)
            },
            LedgerEvent::Transferred {
                from: d.faucet.address(),
                to: borrower,
                amount: tokens(5)
            },
            LedgerEvent::Burned {
                from: borrower,
                amount: parse_units("10.1").unwrap()
            },
            LedgerEvent::LoanSettled {
                borrower,
                principal: tokens(10),
                fee: parse_units("0.1").unwrap(),
                success: true,
            },
        ]
    );

    let seqs: Vec<u64> = d.ledger.events().iter().map(|r| r.seq).collect();
    assert!(seqs.windows(2).all(|w| w[0] < w[1]));
}
