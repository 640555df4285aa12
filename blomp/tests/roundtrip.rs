use std::fs;

use blomp::{
    codec::estimated_size, compare::similarity, Block, BlockTreeDesc, BlompPicture, Corruption,
    Error, Image, Pixel,
};

fn gradient(width: u32, height: u32) -> Image {
    let mut img = Image::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let fx = x as f32 / width.max(2) as f32;
            let fy = y as f32 / height.max(2) as f32;
            let spot = if (x / 4 + y / 4) % 3 == 0 { 0.3 } else { 0.0 };
            img.set(x, y, Pixel::new(fx, fy, (fx * fy + spot).min(1.0)));
        }
    }
    img
}

#[test]
fn file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();

    for (width, height, max_depth, threshold) in [
        (37, 23, 4, 0.0),
        (37, 23, 4, 0.01),
        (64, 16, 6, 0.002),
        (1, 50, 2, 0.1),
        (9, 9, 0, 0.0),
    ] {
        let img = gradient(width, height);
        let desc = BlockTreeDesc::new(max_depth, threshold).unwrap();
        let picture = BlompPicture::from_image(&img, &desc).unwrap();

        let path = dir.path().join(format!("{width}x{height}_{max_depth}.blp"));
        picture.save(&path).unwrap();

        assert_eq!(
            fs::metadata(&path).unwrap().len(),
            picture.estimated_size(),
            "size mismatch for {width}x{height}"
        );

        let loaded = blomp::open(&path).unwrap();
        assert_eq!(loaded.header(), picture.header());
        assert_eq!(loaded.tree().node_count(), picture.tree().node_count());
        assert_eq!(
            loaded.to_image().unwrap().to_rgb8(),
            picture.to_image().unwrap().to_rgb8(),
            "decoding mismatch for {width}x{height}"
        );

        if threshold == 0.0 {
            assert_eq!(loaded.to_image().unwrap().to_rgb8(), img.to_rgb8());
        }
    }
}

#[test]
fn save_and_load_tree() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tree.blp");

    let desc = BlockTreeDesc::new(3, 0.02).unwrap();
    let tree = blomp::build_tree(&gradient(20, 20), &desc).unwrap();
    blomp::save_file(&tree, desc.max_depth, &path).unwrap();

    let (header, loaded) = blomp::load_file(&path).unwrap();
    assert_eq!((header.width, header.height, header.max_depth), (20, 20, 3));
    assert_eq!(loaded.leaf_count(), tree.leaf_count());
    assert_eq!(estimated_size(&loaded), estimated_size(&tree));
}

#[test]
fn corrupt_files() {
    let picture =
        BlompPicture::from_image(&gradient(16, 16), &BlockTreeDesc::default()).unwrap();
    let mut encoded = Vec::new();
    picture.encode(&mut encoded).unwrap();

    let mut bad_magic = encoded.clone();
    bad_magic[3] = b'Q';
    let err = BlompPicture::decode(bad_magic.as_slice()).unwrap_err();
    assert!(matches!(err, Error::CorruptData(Corruption::InvalidIdentifier(_))));

    // First tree bit sits right after the header and the bit count
    let mut leaf_root = encoded.clone();
    leaf_root[24] &= !1;
    let err = BlompPicture::decode(leaf_root.as_slice()).unwrap_err();
    assert!(err.is_corrupt_data());
    assert!(!err.is_fatal());

    let err = BlompPicture::decode(&encoded[..10]).unwrap_err();
    assert!(matches!(err, Error::CorruptData(Corruption::Truncated)));

    let dir = tempfile::tempdir().unwrap();
    let err = blomp::open(&dir.path().join("missing.blp")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn deterministic_output() {
    let img = gradient(45, 31);
    let desc = BlockTreeDesc::new(5, 0.005).unwrap();

    let mut first = Vec::new();
    BlompPicture::from_image(&img, &desc).unwrap().encode(&mut first).unwrap();

    let mut second = Vec::new();
    let tree = blomp::build_tree(&img, &desc).unwrap();
    BlompPicture::from_tree(tree, desc.max_depth)
        .unwrap()
        .encode(&mut second)
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn solid_red_collapses() {
    let img = Image::filled(4, 4, Pixel::new(1.0, 0.0, 0.0));
    let desc = BlockTreeDesc::new(2, 0.0).unwrap();
    let picture = BlompPicture::from_image(&img, &desc).unwrap();

    let root = picture.tree();
    assert!(root.is_parent());
    assert_eq!(root.children().len(), 1);
    assert_eq!(root.children()[0].fill(), Some(Pixel::new(1.0, 0.0, 0.0)));

    let mut encoded = Vec::new();
    picture.encode(&mut encoded).unwrap();
    assert_eq!(&encoded[16..24], &26u64.to_ne_bytes());
    assert_eq!(&encoded[24..], &[0b1111_1101, 0b0000_0011, 0x00, 0x00]);
}

#[test]
fn blue_corner_stays_split() {
    let mut img = Image::filled(4, 4, Pixel::new(1.0, 0.0, 0.0));
    img.set(3, 3, Pixel::new(0.0, 0.0, 1.0));
    let desc = BlockTreeDesc::new(2, 0.0).unwrap();
    let tree = blomp::build_tree(&img, &desc).unwrap();

    // Root, the 4×4 block, the bottom right 2×2 block and its four pixels
    // plus the three untouched 2×2 quadrants
    let top = &tree.children()[0];
    assert!(top.is_parent());
    assert_eq!(top.node_count(), 1 + 3 + 1 + 4);
    assert_eq!(top.leaf_count(), 3 + 4);

    let corner = &top.children()[3];
    assert!(matches!(corner, Block::Parent(_)));
    assert_eq!(corner.children()[3].fill(), Some(Pixel::new(0.0, 0.0, 1.0)));
}

#[test]
fn similarity_drops_with_threshold() {
    let img = gradient(32, 32);

    let render = |threshold: f32| {
        let desc = BlockTreeDesc::new(5, threshold).unwrap();
        BlompPicture::from_image(&img, &desc).unwrap().to_image().unwrap()
    };

    let exact = similarity(&img, &render(0.0)).unwrap();
    let rough = similarity(&img, &render(0.2)).unwrap();

    assert!(exact > 0.99);
    assert!(rough < exact);
    assert!((0.0..=1.0).contains(&rough));
}
