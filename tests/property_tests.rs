use marketplace_order_management::domain::model::{
    derive_overall_status, distinct_sellers, CustomerSnapshot, FulfillmentStatus, LineItem, Money,
    Order, OrderId, OrderNumber, OrderStatus, ProductId, SellerStatus, ShippingAddress, UserId,
};
use proptest::prelude::*;

fn fulfillment_status() -> impl Strategy<Value = FulfillmentStatus> {
    prop::sample::select(FulfillmentStatus::ALL.to_vec())
}

fn order_status() -> impl Strategy<Value = OrderStatus> {
    prop::sample::select(OrderStatus::ALL.to_vec())
}

/// 出品者プールと、各明細がどの出品者の商品かを表す添字列
fn seller_layout() -> impl Strategy<Value = (usize, Vec<usize>)> {
    (1usize..6).prop_flat_map(|pool| (Just(pool), prop::collection::vec(0..pool, 1..20)))
}

fn place_order(sellers: &[UserId], layout: &[usize]) -> Order {
    let items = layout
        .iter()
        .map(|&index| {
            LineItem::new(
                ProductId::new(),
                format!("Product {}", index),
                Money::new(100),
                1,
                sellers[index],
            )
            .unwrap()
        })
        .collect();

    Order::place(
        OrderId::new(),
        OrderNumber::from_sequence(0),
        UserId::new(),
        CustomerSnapshot::new("Prop".to_string(), "prop@example.com".to_string()),
        items,
        Money::new(100 * layout.len() as i64),
        ShippingAddress::default(),
    )
    .unwrap()
}

fn pool_of(size: usize) -> Vec<UserId> {
    (0..size).map(|_| UserId::new()).collect()
}

// 出品者サブステータスの展開に関するプロパティ
proptest! {
    /// 出品者ごとにちょうど一つのエントリが初出順で作られ、すべて Pending で始まる
    #[test]
    fn test_seller_fan_out_is_distinct_and_ordered((pool, layout) in seller_layout()) {
        let sellers = pool_of(pool);
        let order = place_order(&sellers, &layout);

        let mut expected: Vec<UserId> = Vec::new();
        for &index in &layout {
            if !expected.contains(&sellers[index]) {
                expected.push(sellers[index]);
            }
        }

        let actual: Vec<UserId> = order
            .seller_statuses()
            .iter()
            .map(SellerStatus::seller_id)
            .collect();
        prop_assert_eq!(&actual, &expected);
        prop_assert_eq!(distinct_sellers(order.items()), expected);
        prop_assert!(order
            .seller_statuses()
            .iter()
            .all(|entry| entry.status() == FulfillmentStatus::Pending));
        prop_assert_eq!(order.status(), OrderStatus::Pending);
    }

    /// 明細の小計の合計は単価 × 数量の総和と等しい
    #[test]
    fn test_line_items_subtotal_is_sum_of_price_times_quantity(
        lines in prop::collection::vec((0i64..100_000, 1u32..50), 1..10),
    ) {
        let seller = UserId::new();
        let items: Vec<LineItem> = lines
            .iter()
            .map(|&(price, quantity)| {
                LineItem::new(ProductId::new(), "Item".to_string(), Money::new(price), quantity, seller)
                    .unwrap()
            })
            .collect();
        let expected: i64 = lines.iter().map(|&(price, quantity)| price * quantity as i64).sum();

        let order = Order::place(
            OrderId::new(),
            OrderNumber::from_sequence(1),
            UserId::new(),
            CustomerSnapshot::new("Prop".to_string(), "prop@example.com".to_string()),
            items,
            Money::new(expected),
            ShippingAddress::default(),
        )
        .unwrap();

        prop_assert_eq!(order.line_items_subtotal(), Ok(Money::new(expected)));
    }
}

// 注文全体ステータスの導出に関するプロパティ
proptest! {
    /// いずれかの出品者が拒否していれば、現在の値に関係なく Rejected になる
    #[test]
    fn test_rejection_dominates(
        current in order_status(),
        mut statuses in prop::collection::vec(fulfillment_status(), 0..8),
        position in any::<prop::sample::Index>(),
    ) {
        let at = position.index(statuses.len() + 1);
        statuses.insert(at, FulfillmentStatus::Rejected);

        prop_assert_eq!(derive_overall_status(current, statuses), OrderStatus::Rejected);
    }

    /// 導出が Cancelled を新たに生むことはなく、Cancelled も他の値と同じく扱われる
    #[test]
    fn test_cancelled_is_never_derived(
        current in order_status(),
        statuses in prop::collection::vec(fulfillment_status(), 0..8),
    ) {
        let derived = derive_overall_status(current, statuses.clone());
        if current != OrderStatus::Cancelled {
            prop_assert_ne!(derived, OrderStatus::Cancelled);
        }
        let from_pending = derive_overall_status(OrderStatus::Pending, statuses.clone());
        let from_cancelled = derive_overall_status(OrderStatus::Cancelled, statuses);
        if from_pending != OrderStatus::Pending {
            prop_assert_eq!(from_cancelled, from_pending);
        }
    }

    /// 全出品者が受付以降に進んでいれば、結果は現在の値に依存しない
    #[test]
    fn test_progressed_statuses_determine_result(
        first in order_status(),
        second in order_status(),
        statuses in prop::collection::vec(
            prop::sample::select(vec![
                FulfillmentStatus::Accepted,
                FulfillmentStatus::Shipped,
                FulfillmentStatus::Delivered,
            ]),
            1..8,
        ),
    ) {
        prop_assert_eq!(
            derive_overall_status(first, statuses.clone()),
            derive_overall_status(second, statuses)
        );
    }

    /// 導出は順序に依存しない（集合として評価される）
    #[test]
    fn test_derivation_ignores_order(
        current in order_status(),
        statuses in prop::collection::vec(fulfillment_status(), 0..8),
    ) {
        let mut reversed = statuses.clone();
        reversed.reverse();
        prop_assert_eq!(
            derive_overall_status(current, statuses),
            derive_overall_status(current, reversed)
        );
    }
}

// 集約の遷移に関するプロパティ
proptest! {
    /// 同じ更新を2回続けて適用しても、1回適用した場合と同じ全体ステータスになる
    #[test]
    fn test_seller_update_is_idempotent(
        (pool, layout) in seller_layout(),
        history in prop::collection::vec((any::<prop::sample::Index>(), fulfillment_status()), 0..10),
        last in (any::<prop::sample::Index>(), fulfillment_status()),
    ) {
        let sellers = pool_of(pool);
        let mut order = place_order(&sellers, &layout);
        for (index, status) in &history {
            let seller = sellers[index.index(pool)];
            order.apply_seller_status(seller, *status);
        }

        let seller = sellers[last.0.index(pool)];
        order.apply_seller_status(seller, last.1);
        let once = order.status();
        let sub_statuses_once = order.seller_statuses().iter().map(SellerStatus::status).collect::<Vec<_>>();

        order.apply_seller_status(seller, last.1);
        prop_assert_eq!(order.status(), once);
        prop_assert_eq!(
            order.seller_statuses().iter().map(SellerStatus::status).collect::<Vec<_>>(),
            sub_statuses_once
        );
    }

    /// 各更新の後、全体ステータスは直前の値とサブステータスから導出した値と一致する
    #[test]
    fn test_aggregate_status_matches_derivation(
        (pool, layout) in seller_layout(),
        updates in prop::collection::vec((any::<prop::sample::Index>(), fulfillment_status()), 1..15),
    ) {
        let sellers = pool_of(pool);
        let mut order = place_order(&sellers, &layout);

        for (index, status) in updates {
            let before = order.status();
            let revision = order.revision();
            order.apply_seller_status(sellers[index.index(pool)], status);

            let expected = derive_overall_status(
                before,
                order.seller_statuses().iter().map(SellerStatus::status),
            );
            prop_assert_eq!(order.status(), expected);
            prop_assert_eq!(order.revision(), revision + 1);
            prop_assert_eq!(order.seller_statuses().len(), distinct_sellers(order.items()).len());
        }
    }
}
