/// Ingredient classes, in the order of the model's output vector.
pub const CLASS_LABELS: [&str; 35] = [
    "Bawang Bombai",
    "Bawang Merah",
    "Bawang Putih",
    "Brokoli",
    "Cabai Hijau",
    "Cabai Merah",
    "Daging Sapi",
    "Daging Unggas",
    "Ikan",
    "Jagung",
    "Jahe",
    "Jamur",
    "Kacang Hijau",
    "Kacang Merah",
    "Kacang Panjang",
    "Kacang Tanah",
    "Kembang Kol",
    "Kentang",
    "Kikil",
    "Kol",
    "Labu Siam",
    "Mie",
    "Nasi",
    "Petai",
    "Sawi",
    "Selada",
    "Seledri",
    "Telur Ayam",
    "Telur Bebek",
    "Tempe",
    "Terong",
    "Timun",
    "Tomat",
    "Usus",
    "Wortel",
];
